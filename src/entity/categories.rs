use sea_orm::entity::prelude::*;

/// Category ids come from the supplier feed, not a sequence.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::shop_categories::Entity")]
    ShopCategories,
    #[sea_orm(has_many = "super::products::Entity")]
    Products,
}

impl Related<super::shop_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShopCategories.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
