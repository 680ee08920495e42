use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The fixed set of category names the storefront sells under.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(100))")]
pub enum CategoryName {
    #[sea_orm(string_value = "Toys")]
    #[serde(rename = "Toys")]
    Toys,
    #[sea_orm(string_value = "Kids Clothing")]
    #[serde(rename = "Kids Clothing")]
    KidsClothing,
    #[sea_orm(string_value = "Baby Care")]
    #[serde(rename = "Baby Care")]
    BabyCare,
    #[sea_orm(string_value = "Sports")]
    #[serde(rename = "Sports")]
    Sports,
    #[sea_orm(string_value = "Stationary")]
    #[serde(rename = "Stationary")]
    Stationary,
    #[sea_orm(string_value = "Arts & Crafts")]
    #[serde(rename = "Arts & Crafts")]
    ArtsAndCrafts,
}

impl CategoryName {
    pub fn label(&self) -> &'static str {
        match self {
            CategoryName::Toys => "Toys",
            CategoryName::KidsClothing => "Kids Clothing",
            CategoryName::BabyCare => "Baby Care",
            CategoryName::Sports => "Sports",
            CategoryName::Stationary => "Stationary",
            CategoryName::ArtsAndCrafts => "Arts & Crafts",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: CategoryName,
    #[sea_orm(unique)]
    pub slug: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::products::Entity")]
    Products,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
