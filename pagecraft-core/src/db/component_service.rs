use chrono::{DateTime, Utc};
use pagecraft_render::normalize_schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentCategory {
    Layout,
    #[default]
    Content,
    Media,
    Form,
    Interactive,
}

impl ComponentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentCategory::Layout => "layout",
            ComponentCategory::Content => "content",
            ComponentCategory::Media => "media",
            ComponentCategory::Form => "form",
            ComponentCategory::Interactive => "interactive",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "layout" => Some(ComponentCategory::Layout),
            "content" => Some(ComponentCategory::Content),
            "media" => Some(ComponentCategory::Media),
            "form" => Some(ComponentCategory::Form),
            "interactive" => Some(ComponentCategory::Interactive),
            _ => None,
        }
    }
}

/// An authorable component type.
///
/// `schema` is the stored value as found: canonical rows hold an object, legacy
/// rows may hold a JSON-encoded string or a flat property map. `template` is
/// descriptive only and never interpreted when pages render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentDefinition {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: ComponentCategory,
    pub icon: Option<String>,
    pub schema: Value,
    pub template: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewComponent {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: ComponentCategory,
    pub icon: Option<String>,
    pub schema: Value,
    pub template: Option<String>,
}

#[derive(Debug, FromRow)]
struct ComponentRow {
    id: i64,
    name: String,
    slug: String,
    description: Option<String>,
    category: String,
    icon: Option<String>,
    schema: Option<String>,
    template: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ComponentRow> for ComponentDefinition {
    fn from(row: ComponentRow) -> Self {
        let category = ComponentCategory::parse(&row.category).unwrap_or_else(|| {
            tracing::warn!(id = row.id, category = %row.category, "unknown component category, using content");
            ComponentCategory::Content
        });
        ComponentDefinition {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            category,
            icon: row.icon,
            schema: stored_schema(row.schema),
            template: row.template,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Schema column text to a JSON value. Text that is not JSON is kept as a
/// string so the normalizer reports it against this row alone.
fn stored_schema(text: Option<String>) -> Value {
    match text {
        None => Value::Null,
        Some(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
    }
}

/// Source of component definitions for batch jobs.
#[allow(async_fn_in_trait)]
pub trait ComponentStore {
    /// Every component in the store's default order (ascending id).
    async fn list_components(&self) -> CoreResult<Vec<ComponentDefinition>>;

    /// Persist a schema value as given.
    async fn save_schema(&self, id: i64, schema: &Value) -> CoreResult<()>;
}

const SELECT_COMPONENT: &str = r#"
    SELECT id, name, slug, description, category, icon, schema::text AS schema,
           template, is_active, created_at, updated_at
    FROM components
"#;

const RETURNING_COMPONENT: &str = r#"
    RETURNING id, name, slug, description, category, icon, schema::text AS schema,
              template, is_active, created_at, updated_at
"#;

pub struct ComponentService {
    pool: PgPool,
}

impl ComponentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a component. The schema is normalized before it is stored.
    pub async fn create(&self, new: &NewComponent) -> CoreResult<ComponentDefinition> {
        let schema = normalize_schema(&new.schema)?.schema.to_value();
        let sql = format!(
            r#"
            INSERT INTO components (name, slug, description, category, icon, schema, template)
            VALUES ($1, $2, $3, $4, $5, $6::jsonb, $7)
            {}
            "#,
            RETURNING_COMPONENT
        );
        let result = sqlx::query_as::<_, ComponentRow>(&sql)
            .bind(&new.name)
            .bind(&new.slug)
            .bind(&new.description)
            .bind(new.category.as_str())
            .bind(&new.icon)
            .bind(schema.to_string())
            .bind(&new.template)
            .fetch_one(&self.pool)
            .await;
        match result {
            Ok(row) => Ok(row.into()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(CoreError::SlugTaken {
                slug: new.slug.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_by_id(&self, id: i64) -> CoreResult<Option<ComponentDefinition>> {
        let sql = format!("{} WHERE id = $1", SELECT_COMPONENT);
        let row = sqlx::query_as::<_, ComponentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn get_by_slug(&self, slug: &str) -> CoreResult<Option<ComponentDefinition>> {
        let sql = format!("{} WHERE slug = $1", SELECT_COMPONENT);
        let row = sqlx::query_as::<_, ComponentRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn list_components(&self) -> CoreResult<Vec<ComponentDefinition>> {
        let sql = format!("{} ORDER BY id", SELECT_COMPONENT);
        let rows = sqlx::query_as::<_, ComponentRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Components offered when placing new blocks on a page.
    pub async fn list_active(&self) -> CoreResult<Vec<ComponentDefinition>> {
        let sql = format!("{} WHERE is_active ORDER BY category, name, id", SELECT_COMPONENT);
        let rows = sqlx::query_as::<_, ComponentRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Replace a component's schema with the canonical form of `schema`.
    pub async fn update_schema(&self, id: i64, schema: &Value) -> CoreResult<ComponentDefinition> {
        let canonical = normalize_schema(schema)?.schema.to_value();
        let sql = format!(
            "UPDATE components SET schema = $2::jsonb, updated_at = now() WHERE id = $1 {}",
            RETURNING_COMPONENT
        );
        let row = sqlx::query_as::<_, ComponentRow>(&sql)
            .bind(id)
            .bind(canonical.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Into::into).ok_or(CoreError::NotFound { id })
    }

    /// Inactive components stay valid on pages that already use them.
    pub async fn set_active(&self, id: i64, is_active: bool) -> CoreResult<()> {
        let result = sqlx::query(
            r#"UPDATE components SET is_active = $2, updated_at = now() WHERE id = $1"#,
        )
        .bind(id)
        .bind(is_active)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound { id });
        }
        Ok(())
    }
}

impl ComponentStore for ComponentService {
    async fn list_components(&self) -> CoreResult<Vec<ComponentDefinition>> {
        ComponentService::list_components(self).await
    }

    async fn save_schema(&self, id: i64, schema: &Value) -> CoreResult<()> {
        let result = sqlx::query(
            r#"UPDATE components SET schema = $2::jsonb, updated_at = now() WHERE id = $1"#,
        )
        .bind(id)
        .bind(schema.to_string())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound { id });
        }
        Ok(())
    }
}
