use chrono::NaiveDate;
use expense_repo::expense_repo::NewExpense;
use expense_repo::ids::Money;
use expense_repo::product_repo::NewProduct;
use expense_repo::status::RecordStatus;
use fake::faker::lorem::en::{Sentence, Words};
use fake::{Fake, Faker};
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use uuid::Uuid;

pub trait Generator<T> {
    fn gen(&mut self) -> T;
}

pub struct Predefined<T> {
    values: Vec<T>,
    current_pos: usize,
}

impl<T> Predefined<T> {
    pub fn boxed(values: Vec<T>) -> Box<Predefined<T>> {
        Box::new(Predefined {
            values,
            current_pos: 0,
        })
    }
}

impl<T: Clone> Generator<T> for Predefined<T> {
    fn gen(&mut self) -> T {
        let v = self.values[self.current_pos].clone();
        self.current_pos += 1;
        v
    }
}

pub struct RandomSample<T> {
    values: Vec<T>,
}

impl<T> RandomSample<T> {
    pub fn boxed(values: Vec<T>) -> Box<RandomSample<T>> {
        Box::new(RandomSample { values })
    }
}

impl<T: Clone> Generator<T> for RandomSample<T> {
    fn gen(&mut self) -> T {
        self.values.choose(&mut rand::thread_rng()).unwrap().clone()
    }
}

struct FakeDate;

impl Generator<NaiveDate> for FakeDate {
    fn gen(&mut self) -> NaiveDate {
        let days: u32 = (0..3650).fake();
        NaiveDate::from_ymd_opt(2015, 1, 1).unwrap() + chrono::Duration::days(days.into())
    }
}

struct FakeMoney;

impl Generator<Money> for FakeMoney {
    fn gen(&mut self) -> Money {
        let cents: i64 = (1..10_000_000).fake();
        Money::new(Decimal::new(cents, 2)).unwrap()
    }
}

struct FakeNotes;

impl Generator<Option<String>> for FakeNotes {
    fn gen(&mut self) -> Option<String> {
        if Faker.fake::<bool>() {
            Some(Sentence(5..10).fake())
        } else {
            None
        }
    }
}

struct FakeTitle;

impl Generator<String> for FakeTitle {
    fn gen(&mut self) -> String {
        let words: Vec<String> = Words(1..4).fake();
        words.join(" ")
    }
}

pub struct NewExpenseGenerator {
    title_gen: Box<dyn Generator<String>>,
    amnt_gen: Box<dyn Generator<Money>>,
    date_gen: Box<dyn Generator<NaiveDate>>,
    cat_gen: Box<dyn Generator<Option<String>>>,
    note_gen: Box<dyn Generator<Option<String>>>,
}

#[allow(dead_code)]
impl NewExpenseGenerator {
    pub fn with_categories(mut self, categories: Vec<&str>) -> NewExpenseGenerator {
        let categories = categories
            .into_iter()
            .map(|c| Some(c.to_string()))
            .collect();
        self.cat_gen = Predefined::boxed(categories);
        self
    }

    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> NewExpenseGenerator {
        self.date_gen = Predefined::boxed(dates);
        self
    }

    pub fn with_amounts(mut self, amounts: Vec<Money>) -> NewExpenseGenerator {
        self.amnt_gen = Predefined::boxed(amounts);
        self
    }

    pub fn generate(&mut self) -> NewExpense {
        NewExpense::new(
            self.title_gen.gen(),
            self.amnt_gen.gen(),
            self.date_gen.gen(),
            self.cat_gen.gen(),
            self.note_gen.gen(),
        )
    }

    pub fn generate_many(&mut self, count: usize) -> Vec<NewExpense> {
        (0..count).map(|_| self.generate()).collect()
    }
}

impl Default for NewExpenseGenerator {
    fn default() -> Self {
        NewExpenseGenerator {
            title_gen: Box::new(FakeTitle),
            amnt_gen: Box::new(FakeMoney),
            date_gen: Box::new(FakeDate),
            cat_gen: RandomSample::boxed(vec![
                None,
                Some("Misc".to_string()),
                Some("Groceries".to_string()),
                Some("Eating Out".to_string()),
                Some("Transportation".to_string()),
            ]),
            note_gen: Box::new(FakeNotes),
        }
    }
}

/// Product with a code that is unique across test runs
#[allow(dead_code)]
pub fn new_product() -> NewProduct {
    NewProduct {
        code: format!("P-{}", Uuid::new_v4().simple()),
        name: FakeTitle.gen(),
        description: FakeNotes.gen(),
        price: FakeMoney.gen(),
        status: RecordStatus::Active,
    }
}
