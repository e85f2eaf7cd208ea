// Database models for Diesel
use diesel::prelude::*;
use uuid::Uuid;

/// Insertable struct for new users
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub id: Uuid,
    pub uid: &'a str,
    pub name: &'a str,
}

/// Insertable struct for entries; also the upsert payload
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::entries)]
pub struct NewEntry<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: &'a str,
    pub body: &'a str,
}
