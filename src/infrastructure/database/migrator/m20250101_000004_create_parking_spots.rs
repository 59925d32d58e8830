//! Create parking_spots table
//!
//! One row per physical spot. The status column drives the conditional
//! updates in the spot ledger, so it gets a composite index with the zone.

use sea_orm_migration::prelude::*;

use super::m20250101_000003_create_parking_zones::ParkingZones;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingSpots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingSpots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingSpots::ZoneId).integer().not_null())
                    .col(
                        ColumnDef::new(ParkingSpots::SpotNumber)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ParkingSpots::Floor).integer().not_null())
                    .col(
                        ColumnDef::new(ParkingSpots::Status)
                            .string()
                            .not_null()
                            .default("Available"),
                    )
                    .col(ColumnDef::new(ParkingSpots::ReservationId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parking_spots_zone_id")
                            .from(ParkingSpots::Table, ParkingSpots::ZoneId)
                            .to(ParkingZones::Table, ParkingZones::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_spots_zone_id_status")
                    .table(ParkingSpots::Table)
                    .col(ParkingSpots::ZoneId)
                    .col(ParkingSpots::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_spots_zone_id_spot_number")
                    .table(ParkingSpots::Table)
                    .col(ParkingSpots::ZoneId)
                    .col(ParkingSpots::SpotNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingSpots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingSpots {
    Table,
    Id,
    ZoneId,
    SpotNumber,
    Floor,
    Status,
    ReservationId,
}
