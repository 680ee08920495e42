use sea_orm::entity::prelude::*;
use serde_json::Value;

/// What happened. Stored as its string value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum AuditAction {
    #[sea_orm(string_value = "user_signup")]
    UserSignup,
    #[sea_orm(string_value = "user_login")]
    UserLogin,
    #[sea_orm(string_value = "seller_signup")]
    SellerSignup,
    #[sea_orm(string_value = "category_create")]
    CategoryCreate,
    #[sea_orm(string_value = "product_create")]
    ProductCreate,
    #[sea_orm(string_value = "product_update")]
    ProductUpdate,
    #[sea_orm(string_value = "product_delete")]
    ProductDelete,
    #[sea_orm(string_value = "order_place")]
    OrderPlace,
    #[sea_orm(string_value = "order_status_update")]
    OrderStatusUpdate,
    #[sea_orm(string_value = "payment_intent_create")]
    PaymentIntentCreate,
}

impl AuditAction {
    /// Table the action touches.
    pub fn resource(self) -> &'static str {
        match self {
            AuditAction::UserSignup | AuditAction::UserLogin => "users",
            AuditAction::SellerSignup => "sellers",
            AuditAction::CategoryCreate => "categories",
            AuditAction::ProductCreate | AuditAction::ProductUpdate | AuditAction::ProductDelete => {
                "products"
            }
            AuditAction::OrderPlace | AuditAction::OrderStatusUpdate => "orders",
            AuditAction::PaymentIntentCreate => "payments",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: AuditAction,
    pub resource: String,
    pub metadata: Value,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
