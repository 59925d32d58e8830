//! Parking spot entity for database

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parking_spots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub zone_id: i32,

    /// Label like `F2S14`, unique within its zone
    pub spot_number: String,

    pub floor: i32,

    /// Spot status: Available, Reserved, Occupied, Maintenance, OutOfService
    pub status: String,

    /// Reservation currently holding the spot
    #[sea_orm(nullable)]
    pub reservation_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parking_zone::Entity",
        from = "Column::ZoneId",
        to = "super::parking_zone::Column::Id"
    )]
    Zone,
}

impl Related<super::parking_zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Zone.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
