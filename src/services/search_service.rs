use crate::database::DbPool;
use crate::domain::{Action, AuthUser, authorize, is_allowed};
use crate::entities::{
    customer_entity as customers, inventory_entity as inventory, order_entity as orders,
};
use crate::error::AppResult;
use crate::models::{
    CustomerSearchResult, GlobalSearchResponse, InventoryItemResponse, InventorySearchQuery,
    InventorySearchResponse, OrderResponse, SearchResults, SearchScope,
};
use crate::services::order_service::scoped_orders;
use crate::utils::non_empty;
use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

const MIN_QUERY_CHARS: usize = 2;
const RESULTS_PER_CATEGORY: u64 = 10;
const INVENTORY_SEARCH_LIMIT: u64 = 50;

/// `LOWER(column) LIKE '%needle%'`; `needle` must already be lowercase
fn lower_like<C: IntoColumnRef>(column: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{needle}%"))
}

#[derive(Clone)]
pub struct SearchService {
    pool: DbPool,
}

impl SearchService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Searches orders, customers and inventory within what the caller may see.
    /// Queries shorter than two characters return nothing without hitting
    /// the database.
    pub async fn global_search(
        &self,
        user: &AuthUser,
        q: Option<&str>,
        scope: SearchScope,
    ) -> AppResult<GlobalSearchResponse> {
        let q = q.map(str::trim).unwrap_or_default();
        if q.chars().count() < MIN_QUERY_CHARS {
            return Ok(GlobalSearchResponse::default());
        }
        let needle = q.to_lowercase();

        let mut results = SearchResults::default();

        if scope.includes(SearchScope::Orders) {
            results.orders = self.search_orders(user, &needle).await?;
        }
        if scope.includes(SearchScope::Customers)
            && is_allowed(user, Action::SearchCustomers, None)
        {
            results.customers = self.search_customers(&needle).await?;
        }
        if scope.includes(SearchScope::Inventory)
            && is_allowed(user, Action::SearchInventory, None)
        {
            results.inventory = self.search_inventory_items(&needle).await?;
        }

        Ok(GlobalSearchResponse::new(results))
    }

    /// Inventory lookup for the back office, alphabetical
    pub async fn search_inventory(
        &self,
        user: &AuthUser,
        query: InventorySearchQuery,
    ) -> AppResult<InventorySearchResponse> {
        authorize(user, Action::SearchInventory, None)?;

        let mut select = inventory::Entity::find();
        if let Some(text) = non_empty(query.search) {
            let needle = text.to_lowercase();
            select = select.filter(
                Condition::any()
                    .add(lower_like((inventory::Entity, inventory::Column::Name), &needle))
                    .add(lower_like((inventory::Entity, inventory::Column::Sku), &needle))
                    .add(lower_like(
                        (inventory::Entity, inventory::Column::Description),
                        &needle,
                    )),
            );
        }
        if let Some(item_type) = non_empty(query.item_type)
            && !item_type.eq_ignore_ascii_case("all")
        {
            select = select.filter(inventory::Column::ItemType.eq(item_type));
        }

        let items: Vec<InventoryItemResponse> = select
            .order_by_asc(inventory::Column::Name)
            .limit(INVENTORY_SEARCH_LIMIT)
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(InventoryItemResponse::from)
            .collect();

        Ok(InventorySearchResponse {
            count: items.len(),
            items,
        })
    }

    async fn search_orders(&self, user: &AuthUser, needle: &str) -> AppResult<Vec<OrderResponse>> {
        let rows = scoped_orders(user)
            .find_also_related(customers::Entity)
            .filter(
                Condition::any()
                    .add(lower_like((orders::Entity, orders::Column::OrderNumber), needle))
                    .add(lower_like((orders::Entity, orders::Column::Description), needle))
                    .add(lower_like((customers::Entity, customers::Column::FullName), needle)),
            )
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::Id)
            .limit(RESULTS_PER_CATEGORY)
            .all(self.pool.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(order, customer)| OrderResponse::new(order, customer.as_ref()))
            .collect())
    }

    async fn search_customers(&self, needle: &str) -> AppResult<Vec<CustomerSearchResult>> {
        let rows = customers::Entity::find()
            .filter(
                Condition::any()
                    .add(lower_like((customers::Entity, customers::Column::FullName), needle))
                    .add(lower_like((customers::Entity, customers::Column::Email), needle))
                    .add(lower_like((customers::Entity, customers::Column::Phone), needle)),
            )
            .order_by_asc(customers::Column::FullName)
            .limit(RESULTS_PER_CATEGORY)
            .all(self.pool.as_ref())
            .await?;
        Ok(rows.into_iter().map(CustomerSearchResult::from).collect())
    }

    async fn search_inventory_items(&self, needle: &str) -> AppResult<Vec<InventoryItemResponse>> {
        let rows = inventory::Entity::find()
            .filter(
                Condition::any()
                    .add(lower_like((inventory::Entity, inventory::Column::Name), needle))
                    .add(lower_like((inventory::Entity, inventory::Column::ItemType), needle))
                    .add(lower_like((inventory::Entity, inventory::Column::Sku), needle)),
            )
            .order_by_asc(inventory::Column::Name)
            .limit(RESULTS_PER_CATEGORY)
            .all(self.pool.as_ref())
            .await?;
        Ok(rows.into_iter().map(InventoryItemResponse::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use crate::error::AppError;
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction};
    use std::sync::Arc;

    fn transaction_log(service: SearchService) -> Vec<Transaction> {
        Arc::into_inner(service.pool)
            .unwrap()
            .into_transaction_log()
    }

    #[tokio::test]
    async fn test_short_query_never_touches_database() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = SearchService::new(Arc::new(db));
        let admin = AuthUser::new(1, UserRole::Admin);

        for q in [None, Some(""), Some(" a "), Some("é")] {
            let response = service
                .global_search(&admin, q, SearchScope::All)
                .await
                .unwrap();
            assert_eq!(response.total, 0);
        }
        assert!(transaction_log(service).is_empty());
    }

    #[tokio::test]
    async fn test_customer_search_only_covers_own_orders() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<orders::Model>::new()])
            .into_connection();
        let service = SearchService::new(Arc::new(db));
        let customer = AuthUser::new(30, UserRole::Customer);

        let response = service
            .global_search(&customer, Some("Suit"), SearchScope::All)
            .await
            .unwrap();
        assert_eq!(response.total, 0);

        let log = transaction_log(service);
        assert_eq!(log.len(), 1);
        let statement = &log[0].statements()[0];
        assert!(statement.sql.contains(
            r#""orders"."customer_id" IN (SELECT "id" FROM "customers" WHERE "customers"."user_id" = $1)"#
        ));
        assert!(format!("{:?}", statement.values).contains("%suit%"));
    }

    #[tokio::test]
    async fn test_staff_never_gets_customer_results() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = SearchService::new(Arc::new(db));
        let staff = AuthUser::new(2, UserRole::Staff);

        let response = service
            .global_search(&staff, Some("smith"), SearchScope::Customers)
            .await
            .unwrap();
        assert!(response.results.customers.is_empty());
        assert!(transaction_log(service).is_empty());
    }

    #[tokio::test]
    async fn test_customer_cannot_search_inventory() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = SearchService::new(Arc::new(db));

        let err = service
            .search_inventory(
                &AuthUser::new(30, UserRole::Customer),
                InventorySearchQuery::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
