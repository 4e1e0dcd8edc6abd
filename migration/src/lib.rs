pub use sea_orm_migration::prelude::*;

mod m20241001_000001_create_core_tables;
mod m20241001_000002_add_notifications_and_reset_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241001_000001_create_core_tables::Migration),
            Box::new(m20241001_000002_add_notifications_and_reset_tokens::Migration),
        ]
    }
}
