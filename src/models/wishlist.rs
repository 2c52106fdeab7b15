use diesel::prelude::*;

#[derive(Debug, Insertable, Clone, Copy)]
#[diesel(table_name = crate::schema::wishlist)]
pub struct NewWishlistEntry {
    pub user_id: i32,
    pub listing_id: i32,
}
