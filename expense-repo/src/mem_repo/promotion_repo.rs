use crate::ids::{
    CategoryId, ProductId, PromotionApplicableCategoryId, PromotionApplicableProductId,
    PromotionId, PromotionRuleId,
};
use crate::mem_repo::{MemRepo, State};
use crate::promotion_repo::PromotionRepoError::{
    CategoryAlreadyApplicable, CategoryNotApplicable, CategoryNotFound, ProductAlreadyApplicable,
    ProductNotApplicable, ProductNotFound, PromotionNotFound, RuleNotFound,
};
use crate::promotion_repo::{
    NewPromotion, NewPromotionRule, Promotion, PromotionApplicableCategory,
    PromotionApplicableProduct, PromotionRepo, PromotionRepoError, PromotionRule,
};
use async_trait::async_trait;
use chrono::Utc;

fn check_promotion(state: &State, promotion_id: PromotionId) -> Result<(), PromotionRepoError> {
    if state.promotions.contains_key(&promotion_id) {
        Ok(())
    } else {
        Err(PromotionNotFound(promotion_id))
    }
}

#[async_trait]
impl PromotionRepo for MemRepo {
    async fn create_promotion(
        &self,
        new_promotion: NewPromotion,
    ) -> Result<Promotion, PromotionRepoError> {
        new_promotion.check_lengths()?;
        new_promotion.check_schedule()?;
        let mut write_guard = self.write_lock()?;

        let now = Utc::now();
        let promotion = Promotion {
            id: PromotionId::generate(),
            name: new_promotion.name,
            status: new_promotion.status,
            starts_at: new_promotion.starts_at,
            ends_at: new_promotion.ends_at,
            discount_type: new_promotion.discount_type,
            discount_value: new_promotion.discount_value,
            max_discount_amount: new_promotion.max_discount_amount,
            priority: new_promotion.priority,
            created_at: now,
            updated_at: now,
        };
        write_guard.promotions.insert(promotion.id, promotion.clone());
        Ok(promotion)
    }

    async fn get_promotion(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Promotion, PromotionRepoError> {
        let read_guard = self.read_lock()?;

        read_guard
            .promotions
            .get(&promotion_id)
            .cloned()
            .ok_or(PromotionNotFound(promotion_id))
    }

    async fn get_all_promotions(&self) -> Result<Vec<Promotion>, PromotionRepoError> {
        let read_guard = self.read_lock()?;

        let mut promotions: Vec<Promotion> = read_guard.promotions.values().cloned().collect();
        promotions.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.starts_at.cmp(&b.starts_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(promotions)
    }

    async fn update_promotion(
        &self,
        promotion_id: PromotionId,
        updated_promotion: NewPromotion,
    ) -> Result<Promotion, PromotionRepoError> {
        updated_promotion.check_lengths()?;
        updated_promotion.check_schedule()?;
        let mut write_guard = self.write_lock()?;

        let promotion = write_guard
            .promotions
            .get_mut(&promotion_id)
            .ok_or(PromotionNotFound(promotion_id))?;
        promotion.name = updated_promotion.name;
        promotion.status = updated_promotion.status;
        promotion.starts_at = updated_promotion.starts_at;
        promotion.ends_at = updated_promotion.ends_at;
        promotion.discount_type = updated_promotion.discount_type;
        promotion.discount_value = updated_promotion.discount_value;
        promotion.max_discount_amount = updated_promotion.max_discount_amount;
        promotion.priority = updated_promotion.priority;
        promotion.updated_at = Utc::now();
        Ok(promotion.clone())
    }

    async fn delete_promotion(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Promotion, PromotionRepoError> {
        let mut write_guard = self.write_lock()?;

        let promotion = write_guard
            .promotions
            .remove(&promotion_id)
            .ok_or(PromotionNotFound(promotion_id))?;
        write_guard
            .promotion_rules
            .retain(|_, r| r.promotion_id != promotion_id);
        write_guard
            .applicable_products
            .retain(|_, a| a.promotion_id != promotion_id);
        write_guard
            .applicable_categories
            .retain(|_, a| a.promotion_id != promotion_id);
        Ok(promotion)
    }

    async fn add_rule(
        &self,
        promotion_id: PromotionId,
        new_rule: NewPromotionRule,
    ) -> Result<PromotionRule, PromotionRepoError> {
        let mut write_guard = self.write_lock()?;
        check_promotion(&write_guard, promotion_id)?;

        let now = Utc::now();
        let rule = PromotionRule {
            id: PromotionRuleId::generate(),
            promotion_id,
            scope: new_rule.scope,
            min_qty: new_rule.min_qty,
            min_amount: new_rule.min_amount,
            created_at: now,
            updated_at: now,
        };
        write_guard.promotion_rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn get_rules(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Vec<PromotionRule>, PromotionRepoError> {
        let read_guard = self.read_lock()?;
        check_promotion(&read_guard, promotion_id)?;

        let mut rules: Vec<PromotionRule> = read_guard
            .promotion_rules
            .values()
            .filter(|r| r.promotion_id == promotion_id)
            .cloned()
            .collect();
        rules.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rules)
    }

    async fn delete_rule(
        &self,
        promotion_id: PromotionId,
        rule_id: PromotionRuleId,
    ) -> Result<PromotionRule, PromotionRepoError> {
        let mut write_guard = self.write_lock()?;

        match write_guard.promotion_rules.get(&rule_id) {
            Some(rule) if rule.promotion_id == promotion_id => {}
            _ => return Err(RuleNotFound(rule_id)),
        }
        write_guard
            .promotion_rules
            .remove(&rule_id)
            .ok_or(RuleNotFound(rule_id))
    }

    async fn add_applicable_product(
        &self,
        promotion_id: PromotionId,
        product_id: ProductId,
    ) -> Result<PromotionApplicableProduct, PromotionRepoError> {
        let mut write_guard = self.write_lock()?;
        check_promotion(&write_guard, promotion_id)?;
        if !write_guard.products.contains_key(&product_id) {
            return Err(ProductNotFound(product_id));
        }
        if write_guard
            .applicable_products
            .values()
            .any(|a| a.promotion_id == promotion_id && a.product_id == product_id)
        {
            return Err(ProductAlreadyApplicable {
                promotion_id,
                product_id,
            });
        }

        let now = Utc::now();
        let applicable = PromotionApplicableProduct {
            id: PromotionApplicableProductId::generate(),
            promotion_id,
            product_id,
            created_at: now,
            updated_at: now,
        };
        write_guard
            .applicable_products
            .insert(applicable.id, applicable.clone());
        Ok(applicable)
    }

    async fn get_applicable_products(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Vec<PromotionApplicableProduct>, PromotionRepoError> {
        let read_guard = self.read_lock()?;
        check_promotion(&read_guard, promotion_id)?;

        let mut applicable: Vec<PromotionApplicableProduct> = read_guard
            .applicable_products
            .values()
            .filter(|a| a.promotion_id == promotion_id)
            .cloned()
            .collect();
        applicable.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(applicable)
    }

    async fn remove_applicable_product(
        &self,
        promotion_id: PromotionId,
        product_id: ProductId,
    ) -> Result<PromotionApplicableProduct, PromotionRepoError> {
        let mut write_guard = self.write_lock()?;

        let not_applicable = ProductNotApplicable {
            promotion_id,
            product_id,
        };
        let Some(id) = write_guard
            .applicable_products
            .values()
            .find(|a| a.promotion_id == promotion_id && a.product_id == product_id)
            .map(|a| a.id)
        else {
            return Err(not_applicable);
        };
        write_guard
            .applicable_products
            .remove(&id)
            .ok_or(not_applicable)
    }

    async fn add_applicable_category(
        &self,
        promotion_id: PromotionId,
        category_id: CategoryId,
        include_children: bool,
    ) -> Result<PromotionApplicableCategory, PromotionRepoError> {
        let mut write_guard = self.write_lock()?;
        check_promotion(&write_guard, promotion_id)?;
        if !write_guard.categories.contains_key(&category_id) {
            return Err(CategoryNotFound(category_id));
        }
        if write_guard
            .applicable_categories
            .values()
            .any(|a| a.promotion_id == promotion_id && a.category_id == category_id)
        {
            return Err(CategoryAlreadyApplicable {
                promotion_id,
                category_id,
            });
        }

        let now = Utc::now();
        let applicable = PromotionApplicableCategory {
            id: PromotionApplicableCategoryId::generate(),
            promotion_id,
            category_id,
            include_children,
            created_at: now,
            updated_at: now,
        };
        write_guard
            .applicable_categories
            .insert(applicable.id, applicable.clone());
        Ok(applicable)
    }

    async fn get_applicable_categories(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Vec<PromotionApplicableCategory>, PromotionRepoError> {
        let read_guard = self.read_lock()?;
        check_promotion(&read_guard, promotion_id)?;

        let mut applicable: Vec<PromotionApplicableCategory> = read_guard
            .applicable_categories
            .values()
            .filter(|a| a.promotion_id == promotion_id)
            .cloned()
            .collect();
        applicable.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(applicable)
    }

    async fn remove_applicable_category(
        &self,
        promotion_id: PromotionId,
        category_id: CategoryId,
    ) -> Result<PromotionApplicableCategory, PromotionRepoError> {
        let mut write_guard = self.write_lock()?;

        let not_applicable = CategoryNotApplicable {
            promotion_id,
            category_id,
        };
        let Some(id) = write_guard
            .applicable_categories
            .values()
            .find(|a| a.promotion_id == promotion_id && a.category_id == category_id)
            .map(|a| a.id)
        else {
            return Err(not_applicable);
        };
        write_guard
            .applicable_categories
            .remove(&id)
            .ok_or(not_applicable)
    }
}
