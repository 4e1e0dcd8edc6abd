use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    Role,
    IsActive,
    LastLoginAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    UserId,
    FullName,
    Email,
    Phone,
    Address,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Staff {
    Table,
    Id,
    UserId,
    FullName,
    Phone,
    Position,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    OrderNumber,
    CustomerId,
    Description,
    Status,
    TotalAmount,
    RemainingAmount,
    DueDate,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StaffTasks {
    Table,
    Id,
    OrderId,
    StaffId,
    Title,
    Status,
    Notes,
    StartedAt,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    OrderId,
    Amount,
    PaymentMethod,
    TransactionId,
    Notes,
    RecordedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Inventory {
    Table,
    Id,
    Name,
    ItemType,
    Sku,
    Description,
    Quantity,
    Price,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

async fn create_enum(manager: &SchemaManager<'_>, name: &str, values: &[&str]) -> Result<(), DbErr> {
    manager
        .create_type(
            Type::create()
                .as_enum(Alias::new(name))
                .values(values.iter().map(|v| Alias::new(*v)).collect::<Vec<_>>())
                .to_owned(),
        )
        .await
}

fn timestamp_default_now<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .default(Expr::cust("NOW()"))
        .null()
        .to_owned()
}

/// Money columns are BIGINT minor units (cents).
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_enum(manager, "user_role", &["admin", "staff", "customer"]).await?;
        create_enum(
            manager,
            "order_status",
            &["pending", "in-progress", "completed", "delivered", "cancelled"],
        )
        .await?;
        create_enum(manager, "task_status", &["pending", "in-progress", "completed"]).await?;
        create_enum(
            manager,
            "payment_method",
            &["cash", "card", "bank_transfer", "mobile_payment", "cheque"],
        )
        .await?;
        create_enum(
            manager,
            "inventory_status",
            &["in_stock", "low_stock", "out_of_stock"],
        )
        .await?;

        // users
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .custom(Alias::new("user_role"))
                            .not_null()
                            .default(Expr::cust("'customer'::user_role")),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::LastLoginAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut timestamp_default_now(Users::CreatedAt))
                    .col(&mut timestamp_default_now(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // customers (1:1 with users)
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Customers::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Customers::FullName).string_len(100).not_null())
                    .col(ColumnDef::new(Customers::Email).string_len(255).null())
                    .col(ColumnDef::new(Customers::Phone).string_len(30).null())
                    .col(ColumnDef::new(Customers::Address).text().null())
                    .col(&mut timestamp_default_now(Customers::CreatedAt))
                    .col(&mut timestamp_default_now(Customers::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customers_user")
                            .from(Customers::Table, Customers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // staff profiles
        manager
            .create_table(
                Table::create()
                    .table(Staff::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Staff::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Staff::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Staff::FullName).string_len(100).not_null())
                    .col(ColumnDef::new(Staff::Phone).string_len(30).null())
                    .col(ColumnDef::new(Staff::Position).string_len(50).null())
                    .col(&mut timestamp_default_now(Staff::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_staff_user")
                            .from(Staff::Table, Staff::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // orders
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Orders::OrderNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Orders::CustomerId).big_integer().not_null())
                    .col(ColumnDef::new(Orders::Description).text().null())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .custom(Alias::new("order_status"))
                            .not_null()
                            .default(Expr::cust("'pending'::order_status")),
                    )
                    .col(
                        ColumnDef::new(Orders::TotalAmount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Orders::TotalAmount).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Orders::RemainingAmount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Orders::RemainingAmount).gte(0)),
                    )
                    .col(ColumnDef::new(Orders::DueDate).date().null())
                    .col(
                        ColumnDef::new(Orders::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut timestamp_default_now(Orders::CreatedAt))
                    .col(&mut timestamp_default_now(Orders::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_customer")
                            .from(Orders::Table, Orders::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_customer")
                    .table(Orders::Table)
                    .col(Orders::CustomerId)
                    .to_owned(),
            )
            .await?;

        // staff_tasks
        manager
            .create_table(
                Table::create()
                    .table(StaffTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StaffTasks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StaffTasks::OrderId).big_integer().not_null())
                    .col(ColumnDef::new(StaffTasks::StaffId).big_integer().not_null())
                    .col(ColumnDef::new(StaffTasks::Title).string_len(150).not_null())
                    .col(
                        ColumnDef::new(StaffTasks::Status)
                            .custom(Alias::new("task_status"))
                            .not_null()
                            .default(Expr::cust("'pending'::task_status")),
                    )
                    .col(ColumnDef::new(StaffTasks::Notes).text().null())
                    .col(
                        ColumnDef::new(StaffTasks::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StaffTasks::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut timestamp_default_now(StaffTasks::CreatedAt))
                    .col(&mut timestamp_default_now(StaffTasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_staff_tasks_order")
                            .from(StaffTasks::Table, StaffTasks::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_staff_tasks_staff")
                            .from(StaffTasks::Table, StaffTasks::StaffId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_staff_tasks_order")
                    .table(StaffTasks::Table)
                    .col(StaffTasks::OrderId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_staff_tasks_staff")
                    .table(StaffTasks::Table)
                    .col(StaffTasks::StaffId)
                    .to_owned(),
            )
            .await?;

        // payments (append-only)
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::OrderId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Payments::Amount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Payments::Amount).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Payments::PaymentMethod)
                            .custom(Alias::new("payment_method"))
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::TransactionId).string_len(100).null())
                    .col(ColumnDef::new(Payments::Notes).text().null())
                    .col(ColumnDef::new(Payments::RecordedBy).big_integer().not_null())
                    .col(&mut timestamp_default_now(Payments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_order")
                            .from(Payments::Table, Payments::OrderId)
                            .to(Orders::Table, Orders::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_recorded_by")
                            .from(Payments::Table, Payments::RecordedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_payments_order")
                    .table(Payments::Table)
                    .col(Payments::OrderId)
                    .to_owned(),
            )
            .await?;

        // inventory catalog
        manager
            .create_table(
                Table::create()
                    .table(Inventory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Inventory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Inventory::Name).string_len(150).not_null())
                    .col(ColumnDef::new(Inventory::ItemType).string_len(50).not_null())
                    .col(ColumnDef::new(Inventory::Sku).string_len(50).null())
                    .col(ColumnDef::new(Inventory::Description).text().null())
                    .col(
                        ColumnDef::new(Inventory::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Inventory::Price)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Inventory::Status)
                            .custom(Alias::new("inventory_status"))
                            .not_null()
                            .default(Expr::cust("'in_stock'::inventory_status")),
                    )
                    .col(&mut timestamp_default_now(Inventory::CreatedAt))
                    .col(&mut timestamp_default_now(Inventory::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // reverse dependency order
        for table in [
            "payments",
            "staff_tasks",
            "orders",
            "staff",
            "customers",
            "inventory",
            "users",
        ] {
            manager
                .drop_table(Table::drop().if_exists().table(Alias::new(table)).to_owned())
                .await?;
        }
        for name in [
            "inventory_status",
            "payment_method",
            "task_status",
            "order_status",
            "user_role",
        ] {
            manager
                .drop_type(Type::drop().if_exists().name(Alias::new(name)).to_owned())
                .await?;
        }
        Ok(())
    }
}
