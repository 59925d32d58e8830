//! Reservation entity for database

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    pub car_id: i32,
    pub spot_id: i32,

    pub created_at: DateTimeUtc,

    #[sea_orm(nullable)]
    pub entry_time: Option<DateTimeUtc>,

    #[sea_orm(nullable)]
    pub exit_time: Option<DateTimeUtc>,

    /// Parking or cancellation fee, set once computed
    #[sea_orm(column_type = "Decimal(Some((18, 2)))", nullable)]
    pub total_amount: Option<Decimal>,

    /// Self-verifying gate token; written right after insert
    pub qr_token: String,

    pub is_paid: bool,

    /// Session status: Reserved, Active, Completed, Cancelled
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::car::Entity",
        from = "Column::CarId",
        to = "super::car::Column::Id"
    )]
    Car,
    #[sea_orm(
        belongs_to = "super::parking_spot::Entity",
        from = "Column::SpotId",
        to = "super::parking_spot::Column::Id"
    )]
    Spot,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Car.def()
    }
}

impl Related<super::parking_spot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Spot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
