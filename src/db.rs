// src/db.rs
use crate::models::*;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePool::connect(database_url).await?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(crate) fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Idempotent schema setup, run once at startup before serving traffic.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    // Catalog queries

    pub async fn list_plugins(
        &self,
        search: &str,
        category: &str,
        sort_by: &str,
        order: &str,
    ) -> Result<Vec<Plugin>, sqlx::Error> {
        // Sort column and direction come from fixed whitelists, never from
        // the caller's string directly
        let sort_col = match sort_by {
            "download_count" => "download_count",
            "updated_at" => "updated_at",
            _ => "created_at",
        };
        let direction = if order.eq_ignore_ascii_case("asc") {
            "ASC"
        } else {
            "DESC"
        };

        let mut sql = String::from("SELECT * FROM plugins WHERE 1=1");
        if !search.is_empty() {
            sql.push_str(" AND (LOWER(name) LIKE ? OR LOWER(description) LIKE ?)");
        }
        if !category.is_empty() {
            sql.push_str(" AND category = ?");
        }
        sql.push_str(&format!(" ORDER BY {} {}", sort_col, direction));

        let mut query = sqlx::query_as::<_, Plugin>(&sql);
        if !search.is_empty() {
            let pattern = format!("%{}%", search.to_lowercase());
            query = query.bind(pattern.clone()).bind(pattern);
        }
        if !category.is_empty() {
            query = query.bind(category.to_string());
        }

        query.fetch_all(&self.pool).await
    }

    /// Every non-null category in the table, independent of the current
    /// search/filter parameters; feeds the filter UI.
    pub async fn distinct_categories(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM plugins
             WHERE category IS NOT NULL AND category != ''
             ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create_plugin(&self, fields: &PluginFields) -> Result<Plugin, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO plugins (name, description, download_url, category, install_guide)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.download_url)
        .bind(&fields.category)
        .bind(&fields.install_guide)
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, Plugin>("SELECT * FROM plugins WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&self.pool)
            .await
    }

    pub async fn get_plugin(&self, id: i64) -> Result<Option<Plugin>, sqlx::Error> {
        sqlx::query_as::<_, Plugin>("SELECT * FROM plugins WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Apply new field values to a plugin, archiving the pre-update state
    /// as a version row first. Snapshot and update commit together; a
    /// missing row creates no snapshot and reports None.
    pub async fn update_plugin(
        &self,
        id: i64,
        fields: &PluginFields,
        version_label: &str,
    ) -> Result<Option<Plugin>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Plugin>("SELECT * FROM plugins WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(current) = current else {
            return Ok(None);
        };

        sqlx::query(
            "INSERT INTO plugin_versions
                 (plugin_id, version_number, name, description, download_url, category, install_guide)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(current.id)
        .bind(version_label)
        .bind(&current.name)
        .bind(&current.description)
        .bind(&current.download_url)
        .bind(&current.category)
        .bind(&current.install_guide)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Plugin>(
            "UPDATE plugins
             SET name = ?, description = ?, download_url = ?, category = ?, install_guide = ?,
                 updated_at = datetime('now')
             WHERE id = ?
             RETURNING *",
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.download_url)
        .bind(&fields.category)
        .bind(&fields.install_guide)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Delete a plugin and all its version rows in one transaction, so no
    /// intermediate state is observable.
    pub async fn delete_plugin(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM plugin_versions WHERE plugin_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM plugins WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Single atomic increment-and-read; concurrent downloads of the same
    /// id never lose updates.
    pub async fn increment_download(&self, id: i64) -> Result<Option<(String, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64)>(
            "UPDATE plugins SET download_count = download_count + 1
             WHERE id = ?
             RETURNING download_url, download_count",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_versions(&self, plugin_id: i64) -> Result<Vec<PluginVersion>, sqlx::Error> {
        sqlx::query_as::<_, PluginVersion>(
            "SELECT * FROM plugin_versions
             WHERE plugin_id = ?
             ORDER BY created_at DESC, id DESC",
        )
        .bind(plugin_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Up to 4 random same-category peers, topped up with random plugins
    /// from any category when the category has too few. None when the
    /// given id does not exist.
    pub async fn related_plugins(
        &self,
        id: i64,
    ) -> Result<Option<Vec<RelatedPlugin>>, sqlx::Error> {
        let current = sqlx::query_scalar::<_, Option<String>>(
            "SELECT category FROM plugins WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(category) = current else {
            return Ok(None);
        };

        let mut related = match category {
            Some(ref cat) if !cat.is_empty() => {
                sqlx::query_as::<_, RelatedPlugin>(
                    "SELECT id, name, description, category, download_count
                     FROM plugins
                     WHERE id != ? AND category = ?
                     ORDER BY RANDOM()
                     LIMIT 4",
                )
                .bind(id)
                .bind(cat)
                .fetch_all(&self.pool)
                .await?
            }
            _ => Vec::new(),
        };

        if related.len() < 4 {
            let mut exclude: Vec<i64> = related.iter().map(|p| p.id).collect();
            exclude.push(id);

            let placeholders = exclude.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let sql = format!(
                "SELECT id, name, description, category, download_count
                 FROM plugins
                 WHERE id NOT IN ({})
                 ORDER BY RANDOM()
                 LIMIT ?",
                placeholders
            );

            let mut query = sqlx::query_as::<_, RelatedPlugin>(&sql);
            for excluded_id in &exclude {
                query = query.bind(excluded_id);
            }
            let additional = query
                .bind((4 - related.len()) as i64)
                .fetch_all(&self.pool)
                .await?;
            related.extend(additional);
        }

        Ok(Some(related))
    }

    // Singleton configuration rows

    pub async fn group_config(&self) -> Result<Option<GroupConfig>, sqlx::Error> {
        sqlx::query_as::<_, GroupConfig>(
            "SELECT qq_group_name, qq_group_number, qq_group_link, site_name
             FROM config WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn update_group_config(
        &self,
        name: &str,
        number: &str,
        link: &str,
    ) -> Result<Option<GroupConfig>, sqlx::Error> {
        sqlx::query_as::<_, GroupConfig>(
            "UPDATE config
             SET qq_group_name = ?, qq_group_number = ?, qq_group_link = ?,
                 updated_at = datetime('now')
             WHERE id = 1
             RETURNING qq_group_name, qq_group_number, qq_group_link, site_name",
        )
        .bind(name)
        .bind(number)
        .bind(link)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn site_config(&self) -> Result<Option<SiteConfig>, sqlx::Error> {
        sqlx::query_as::<_, SiteConfig>(
            "SELECT site_name, site_description FROM config WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn update_site_config(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Option<SiteConfig>, sqlx::Error> {
        sqlx::query_as::<_, SiteConfig>(
            "UPDATE config
             SET site_name = ?, site_description = ?, updated_at = datetime('now')
             WHERE id = 1
             RETURNING site_name, site_description",
        )
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await
    }

    /// Latest banner row, or None before the first save.
    pub async fn ad_config(&self) -> Result<Option<AdConfig>, sqlx::Error> {
        sqlx::query_as::<_, AdConfig>("SELECT * FROM ad_config ORDER BY id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
    }

    /// Update the single existing banner row if present, insert the first
    /// one otherwise. The existence check and the write share a transaction.
    pub async fn save_ad_config(&self, fields: &AdFields) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM ad_config LIMIT 1")
            .fetch_optional(&mut *tx)
            .await?;

        match existing {
            Some(ad_id) => {
                sqlx::query(
                    "UPDATE ad_config
                     SET title = ?, subtitle = ?, enabled = ?, updated_at = datetime('now')
                     WHERE id = ?",
                )
                .bind(&fields.title)
                .bind(&fields.subtitle)
                .bind(fields.enabled)
                .bind(ad_id)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("INSERT INTO ad_config (title, subtitle, enabled) VALUES (?, ?, ?)")
                    .bind(&fields.title)
                    .bind(&fields.subtitle)
                    .bind(fields.enabled)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    // Single-connection pool: every statement sees the same in-memory file
    async fn test_db() -> Database {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let db = Database { pool };
        db.migrate().await.unwrap();
        db
    }

    fn fields(name: &str, category: Option<&str>) -> PluginFields {
        PluginFields {
            name: name.to_string(),
            description: Some(format!("{} description", name)),
            download_url: "https://example.com/plugin.zip".to_string(),
            category: category.map(str::to_string),
            install_guide: None,
        }
    }

    #[tokio::test]
    async fn create_and_fetch() {
        let db = test_db().await;
        let plugin = db.create_plugin(&fields("Dark Reader", Some("theme"))).await.unwrap();

        assert_eq!(plugin.name, "Dark Reader");
        assert_eq!(plugin.download_count, 0);

        let fetched = db.get_plugin(plugin.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, plugin.id);
        assert!(db.get_plugin(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_archives_the_pre_update_state() {
        let db = test_db().await;
        let plugin = db.create_plugin(&fields("A", Some("tools"))).await.unwrap();

        let mut next = fields("B", Some("tools"));
        next.download_url = "https://example.com/v2.zip".to_string();
        let updated = db.update_plugin(plugin.id, &next, "2.0.0").await.unwrap().unwrap();
        assert_eq!(updated.name, "B");

        // Exactly one snapshot, holding the state from before the update
        let versions = db.list_versions(plugin.id).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].name, "A");
        assert_eq!(versions[0].version_number, "2.0.0");
        assert_eq!(versions[0].download_url, "https://example.com/plugin.zip");
    }

    #[tokio::test]
    async fn update_of_missing_plugin_creates_no_snapshot() {
        let db = test_db().await;
        let result = db.update_plugin(42, &fields("X", None), "1.0.0").await.unwrap();
        assert!(result.is_none());

        let versions = db.list_versions(42).await.unwrap();
        assert!(versions.is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_version_history() {
        let db = test_db().await;
        let plugin = db.create_plugin(&fields("A", None)).await.unwrap();
        db.update_plugin(plugin.id, &fields("B", None), "1.1.0").await.unwrap();
        db.update_plugin(plugin.id, &fields("C", None), "1.2.0").await.unwrap();
        assert_eq!(db.list_versions(plugin.id).await.unwrap().len(), 2);

        assert!(db.delete_plugin(plugin.id).await.unwrap());
        assert!(db.get_plugin(plugin.id).await.unwrap().is_none());
        assert!(db.list_versions(plugin.id).await.unwrap().is_empty());

        assert!(!db.delete_plugin(plugin.id).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_download_increments_are_not_lost() {
        let db = test_db().await;
        let plugin = db.create_plugin(&fields("Popular", None)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let db = db.clone();
            let id = plugin.id;
            handles.push(tokio::spawn(async move {
                db.increment_download(id).await.unwrap().unwrap()
            }));
        }

        let mut counts = Vec::new();
        for handle in handles {
            let (url, count) = handle.await.unwrap();
            assert_eq!(url, "https://example.com/plugin.zip");
            counts.push(count);
        }

        // Each call observed the value it persisted; the sum is exact
        counts.sort_unstable();
        assert_eq!(counts, (1..=20).collect::<Vec<i64>>());
        assert_eq!(db.get_plugin(plugin.id).await.unwrap().unwrap().download_count, 20);

        assert!(db.increment_download(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let db = test_db().await;
        db.create_plugin(&fields("Ad Blocker", Some("privacy"))).await.unwrap();
        db.create_plugin(&fields("Tab Manager", Some("tools"))).await.unwrap();
        let popular = db.create_plugin(&fields("Dark Reader", Some("theme"))).await.unwrap();
        for _ in 0..3 {
            db.increment_download(popular.id).await.unwrap();
        }

        // Substring search is case-insensitive over name OR description
        let found = db.list_plugins("dark", "", "created_at", "desc").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Dark Reader");
        let found = db.list_plugins("MANAGER DESCRIPTION", "", "created_at", "desc").await.unwrap();
        assert_eq!(found.len(), 1);

        // Category is an exact filter
        let found = db.list_plugins("", "tools", "created_at", "desc").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Tab Manager");

        // Sort by download_count both directions
        let sorted = db.list_plugins("", "", "download_count", "desc").await.unwrap();
        assert_eq!(sorted[0].name, "Dark Reader");
        let sorted = db.list_plugins("", "", "download_count", "asc").await.unwrap();
        assert_eq!(sorted[2].name, "Dark Reader");

        // Unknown sort key falls back to created_at without erroring
        let fallback = db.list_plugins("", "", "nonsense", "desc").await.unwrap();
        assert_eq!(fallback.len(), 3);

        let categories = db.distinct_categories().await.unwrap();
        assert_eq!(categories, vec!["privacy", "theme", "tools"]);
    }

    #[tokio::test]
    async fn categories_ignore_current_filters() {
        let db = test_db().await;
        db.create_plugin(&fields("A", Some("privacy"))).await.unwrap();
        db.create_plugin(&fields("B", Some("tools"))).await.unwrap();
        db.create_plugin(&fields("C", None)).await.unwrap();

        // The category list covers the whole table, not the filtered view
        let filtered = db.list_plugins("", "privacy", "created_at", "desc").await.unwrap();
        assert_eq!(filtered.len(), 1);
        let categories = db.distinct_categories().await.unwrap();
        assert_eq!(categories, vec!["privacy", "tools"]);
    }

    #[tokio::test]
    async fn related_prefers_same_category() {
        let db = test_db().await;
        let source = db.create_plugin(&fields("Source", Some("theme"))).await.unwrap();
        for i in 0..5 {
            db.create_plugin(&fields(&format!("Theme {}", i), Some("theme"))).await.unwrap();
        }
        db.create_plugin(&fields("Other", Some("tools"))).await.unwrap();

        let related = db.related_plugins(source.id).await.unwrap().unwrap();
        assert_eq!(related.len(), 4);
        assert!(related.iter().all(|p| p.category.as_deref() == Some("theme")));
        assert!(related.iter().all(|p| p.id != source.id));
    }

    #[tokio::test]
    async fn related_tops_up_from_other_categories() {
        let db = test_db().await;
        let source = db.create_plugin(&fields("Source", Some("theme"))).await.unwrap();
        let peer = db.create_plugin(&fields("Peer", Some("theme"))).await.unwrap();
        for i in 0..4 {
            db.create_plugin(&fields(&format!("Tool {}", i), Some("tools"))).await.unwrap();
        }

        let related = db.related_plugins(source.id).await.unwrap().unwrap();
        assert_eq!(related.len(), 4);
        assert!(related.iter().any(|p| p.id == peer.id));
        assert!(related.iter().all(|p| p.id != source.id));

        // No duplicates across the two samples
        let mut ids: Vec<i64> = related.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[tokio::test]
    async fn related_handles_small_catalogs_and_missing_ids() {
        let db = test_db().await;
        assert!(db.related_plugins(1).await.unwrap().is_none());

        let source = db.create_plugin(&fields("Lonely", None)).await.unwrap();
        let related = db.related_plugins(source.id).await.unwrap().unwrap();
        assert!(related.is_empty());

        db.create_plugin(&fields("Neighbor", Some("tools"))).await.unwrap();
        let related = db.related_plugins(source.id).await.unwrap().unwrap();
        assert_eq!(related.len(), 1);
    }

    #[tokio::test]
    async fn config_singleton_is_seeded_and_update_only() {
        let db = test_db().await;

        let group = db.group_config().await.unwrap().unwrap();
        assert_eq!(group.site_name, "ZmoHub");

        let updated = db
            .update_group_config("New Group", "12345", "https://qm.qq.com/q/abc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.qq_group_number, "12345");

        let site = db.update_site_config("PluginHub", "All the plugins").await.unwrap().unwrap();
        assert_eq!(site.site_name, "PluginHub");
        // Group and site views read the same singleton row
        assert_eq!(db.group_config().await.unwrap().unwrap().site_name, "PluginHub");
    }

    #[tokio::test]
    async fn ad_config_upsert_keeps_a_single_row() {
        let db = test_db().await;

        // Migration seeds the first row
        let seeded = db.ad_config().await.unwrap().unwrap();
        assert!(seeded.enabled);

        db.save_ad_config(&AdFields {
            title: "Spring sale".to_string(),
            subtitle: "Everything new".to_string(),
            enabled: false,
        })
        .await
        .unwrap();

        let current = db.ad_config().await.unwrap().unwrap();
        assert_eq!(current.id, seeded.id);
        assert_eq!(current.title, "Spring sale");
        assert!(!current.enabled);
    }
}
