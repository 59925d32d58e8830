//! Create parking_zones table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingZones::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingZones::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingZones::Name).string().not_null())
                    .col(
                        ColumnDef::new(ParkingZones::TotalFloors)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingZones::SpotsPerFloor)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingZones::HourlyRate)
                            .decimal_len(18, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingZones::IsFull)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ParkingZones::Description).string())
                    .col(
                        ColumnDef::new(ParkingZones::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingZones::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingZones {
    Table,
    Id,
    Name,
    TotalFloors,
    SpotsPerFloor,
    HourlyRate,
    IsFull,
    Description,
    CreatedAt,
}
