pub use sea_orm_migration::prelude::*;

mod m20260110_000000_accounts;
mod m20260118_000000_marketplace;
mod m20260125_000000_community;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260110_000000_accounts::Migration),
            Box::new(m20260118_000000_marketplace::Migration),
            Box::new(m20260125_000000_community::Migration),
        ]
    }
}
