//! Alias repository (§4.3): stores the normalized-name variants generated by
//! [`crate::text::generate_aliases`] so fuzzy lookups don't need to
//! regenerate variants for every row on every search.

use sqlx::PgPool;

use super::columns::ALIAS_COLUMNS;
use crate::models::{Alias, EntityKind};

#[derive(Clone)]
pub struct AliasRepository {
    pool: PgPool,
}

impl AliasRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_entity(&self, kind: EntityKind, entity_id: i64) -> Result<Vec<Alias>, sqlx::Error> {
        let sql = format!("SELECT {ALIAS_COLUMNS} FROM aliases WHERE entity_kind = $1 AND entity_id = $2");
        sqlx::query_as::<_, Alias>(&sql)
            .bind(kind)
            .bind(entity_id)
            .fetch_all(&self.pool)
            .await
    }

    /// Entity ids of a given kind with an exact normalized-alias hit.
    pub async fn find_entity_ids_by_normalized_alias(
        &self,
        kind: EntityKind,
        normalized_alias: &str,
    ) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT entity_id FROM aliases WHERE entity_kind = $1 AND normalized_alias = $2",
        )
        .bind(kind)
        .bind(normalized_alias)
        .fetch_all(&self.pool)
        .await
    }

    /// Replaces the full alias set for one entity. Called by the Catalog
    /// Writer whenever a canonical name changes (§4.3, §4.4).
    pub async fn replace_for_entity(
        &self,
        kind: EntityKind,
        entity_id: i64,
        variants: &[(String, String, String)],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM aliases WHERE entity_kind = $1 AND entity_id = $2")
            .bind(kind)
            .bind(entity_id)
            .execute(&mut *tx)
            .await?;
        for (alias, normalized_alias, source) in variants {
            sqlx::query(
                r#"INSERT INTO aliases (entity_kind, entity_id, alias, normalized_alias, source)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT DO NOTHING"#,
            )
            .bind(kind)
            .bind(entity_id)
            .bind(alias)
            .bind(normalized_alias)
            .bind(source)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }

    /// Drops every alias row for one entity, used when the entity itself is
    /// deleted rather than renamed (§3 cascading artist delete).
    pub async fn delete_for_entity(&self, kind: EntityKind, entity_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM aliases WHERE entity_kind = $1 AND entity_id = $2")
            .bind(kind)
            .bind(entity_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_columns_constant_well_formed() {
        assert!(ALIAS_COLUMNS.contains("normalized_alias"));
    }
}
