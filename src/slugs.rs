//! URL slugs for categories and products.
//!
//! The first candidate is the plain slugified name. When it is taken, further
//! candidates carry a random six character hex suffix until one is free.

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

pub fn base_slug(name: &str) -> String {
    let slug = ::slug::slugify(name);
    if slug.is_empty() { random_token() } else { slug }
}

fn random_token() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}

/// Endless sequence of slug candidates for `name`.
pub fn candidates(name: &str) -> impl Iterator<Item = String> {
    let base = base_slug(name);
    std::iter::once(base.clone()).chain(std::iter::repeat_with(move || {
        format!("{}-{}", base, random_token())
    }))
}

/// Picks a slug that no row of `E` holds in `column` yet.
///
/// The unique index on the column stays the final guard against a concurrent insert.
pub async fn unique_slug<E, C>(conn: &C, column: E::Column, name: &str) -> Result<String, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    for candidate in candidates(name) {
        let existing = E::find()
            .filter(column.eq(candidate.clone()))
            .one(conn)
            .await?;
        if existing.is_none() {
            return Ok(candidate);
        }
    }
    unreachable!("candidates() is endless")
}
