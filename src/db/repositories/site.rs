//! Site repository
//!
//! The contact block and the club profile are singletons in practice: the
//! public site reads one of each, and the admin upserts that same row.

use crate::db::DynDatabasePool;
use crate::models::{ClubInput, ClubProfile, ContactInfo, ContactInput, HeroSlide, SocialLink};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::sync::Arc;

const CONTACT_COLUMNS: &str = "id, title, phone_primary, phone_secondary, email, address, \
     map_url, working_hours, whatsapp, telegram, instagram, youtube, vk, created_at, updated_at";

const CLUB_COLUMNS: &str = "id, name, tagline, mission, story, founded_year, hero_video, \
     hero_description, seo_title, seo_description, updated_at";

/// Site repository trait
#[async_trait]
pub trait SiteRepository: Send + Sync {
    /// Most recently updated contact block
    async fn latest_contact(&self) -> Result<Option<ContactInfo>>;

    /// Oldest club profile
    async fn first_club(&self) -> Result<Option<ClubProfile>>;

    /// Replace the contact block shown on the site, creating it if absent
    async fn upsert_contact(&self, input: &ContactInput) -> Result<ContactInfo>;

    /// Replace the club profile shown on the site, creating it if absent
    async fn upsert_club(&self, input: &ClubInput) -> Result<ClubProfile>;
}

/// SQLx-based site repository implementation
pub struct SqlxSiteRepository {
    pool: DynDatabasePool,
}

impl SqlxSiteRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SiteRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.sqlite()
    }

    async fn latest_contact_id(&self) -> Result<Option<i64>> {
        sqlx::query_scalar("SELECT id FROM contact_info ORDER BY updated_at DESC, id DESC LIMIT 1")
            .fetch_optional(self.db())
            .await
            .context("Failed to look up contact block")
    }

    async fn first_club_id(&self) -> Result<Option<i64>> {
        sqlx::query_scalar("SELECT id FROM club_profiles ORDER BY id LIMIT 1")
            .fetch_optional(self.db())
            .await
            .context("Failed to look up club profile")
    }

    async fn get_contact(&self, id: i64) -> Result<Option<ContactInfo>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM contact_info WHERE id = ?",
            CONTACT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db())
        .await
        .context("Failed to get contact block")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut contact = row_to_contact(&row)?;

        contact.social_links = sqlx::query(
            "SELECT id, title, url, icon, sort_order FROM social_links \
             WHERE contact_id = ? ORDER BY sort_order, title",
        )
        .bind(id)
        .fetch_all(self.db())
        .await
        .context("Failed to load social links")?
        .iter()
        .map(|row| {
            Ok(SocialLink {
                id: row.try_get("id")?,
                title: row.try_get("title")?,
                url: row.try_get("url")?,
                icon: row.try_get("icon")?,
                order: row.try_get("sort_order")?,
            })
        })
        .collect::<Result<_>>()?;

        Ok(Some(contact))
    }

    async fn get_club(&self, id: i64) -> Result<Option<ClubProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM club_profiles WHERE id = ?",
            CLUB_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db())
        .await
        .context("Failed to get club profile")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut club = row_to_club(&row)?;

        club.hero_slides = sqlx::query(
            "SELECT id, title, subtitle, image, sort_order FROM hero_slides \
             WHERE profile_id = ? ORDER BY sort_order, id",
        )
        .bind(id)
        .fetch_all(self.db())
        .await
        .context("Failed to load hero slides")?
        .iter()
        .map(|row| {
            Ok(HeroSlide {
                id: row.try_get("id")?,
                title: row.try_get("title")?,
                subtitle: row.try_get("subtitle")?,
                image: row.try_get("image")?,
                order: row.try_get("sort_order")?,
            })
        })
        .collect::<Result<_>>()?;

        Ok(Some(club))
    }
}

#[async_trait]
impl SiteRepository for SqlxSiteRepository {
    async fn latest_contact(&self) -> Result<Option<ContactInfo>> {
        match self.latest_contact_id().await? {
            Some(id) => self.get_contact(id).await,
            None => Ok(None),
        }
    }

    async fn first_club(&self) -> Result<Option<ClubProfile>> {
        match self.first_club_id().await? {
            Some(id) => self.get_club(id).await,
            None => Ok(None),
        }
    }

    async fn upsert_contact(&self, input: &ContactInput) -> Result<ContactInfo> {
        let now = Utc::now();
        let existing = self.latest_contact_id().await?;
        let mut tx = self.db().begin().await?;

        let id = match existing {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE contact_info
                    SET title = ?, phone_primary = ?, phone_secondary = ?, email = ?,
                        address = ?, map_url = ?, working_hours = ?, whatsapp = ?,
                        telegram = ?, instagram = ?, youtube = ?, vk = ?, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&input.title)
                .bind(&input.phone_primary)
                .bind(&input.phone_secondary)
                .bind(&input.email)
                .bind(&input.address)
                .bind(&input.map_url)
                .bind(&input.working_hours)
                .bind(&input.whatsapp)
                .bind(&input.telegram)
                .bind(&input.instagram)
                .bind(&input.youtube)
                .bind(&input.vk)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to update contact block")?;

                sqlx::query("DELETE FROM social_links WHERE contact_id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to clear social links")?;
                id
            }
            None => sqlx::query(
                r#"
                INSERT INTO contact_info (title, phone_primary, phone_secondary, email, address,
                    map_url, working_hours, whatsapp, telegram, instagram, youtube, vk,
                    created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&input.title)
            .bind(&input.phone_primary)
            .bind(&input.phone_secondary)
            .bind(&input.email)
            .bind(&input.address)
            .bind(&input.map_url)
            .bind(&input.working_hours)
            .bind(&input.whatsapp)
            .bind(&input.telegram)
            .bind(&input.instagram)
            .bind(&input.youtube)
            .bind(&input.vk)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to create contact block")?
            .last_insert_rowid(),
        };

        write_social_links(&mut tx, id, input).await?;
        tx.commit().await?;

        self.get_contact(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Contact block not found after save"))
    }

    async fn upsert_club(&self, input: &ClubInput) -> Result<ClubProfile> {
        let now = Utc::now();
        let existing = self.first_club_id().await?;
        let mut tx = self.db().begin().await?;

        let id = match existing {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE club_profiles
                    SET name = ?, tagline = ?, mission = ?, story = ?, founded_year = ?,
                        hero_video = ?, hero_description = ?, seo_title = ?,
                        seo_description = ?, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&input.name)
                .bind(&input.tagline)
                .bind(&input.mission)
                .bind(&input.story)
                .bind(input.founded_year)
                .bind(&input.hero_video)
                .bind(&input.hero_description)
                .bind(&input.seo_title)
                .bind(&input.seo_description)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to update club profile")?;

                sqlx::query("DELETE FROM hero_slides WHERE profile_id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to clear hero slides")?;
                id
            }
            None => sqlx::query(
                r#"
                INSERT INTO club_profiles (name, tagline, mission, story, founded_year,
                    hero_video, hero_description, seo_title, seo_description, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&input.name)
            .bind(&input.tagline)
            .bind(&input.mission)
            .bind(&input.story)
            .bind(input.founded_year)
            .bind(&input.hero_video)
            .bind(&input.hero_description)
            .bind(&input.seo_title)
            .bind(&input.seo_description)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to create club profile")?
            .last_insert_rowid(),
        };

        write_hero_slides(&mut tx, id, input).await?;
        tx.commit().await?;

        self.get_club(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Club profile not found after save"))
    }
}

async fn write_social_links(
    conn: &mut SqliteConnection,
    contact_id: i64,
    input: &ContactInput,
) -> Result<()> {
    for link in &input.social_links {
        sqlx::query(
            "INSERT INTO social_links (contact_id, title, url, icon, sort_order) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(contact_id)
        .bind(&link.title)
        .bind(&link.url)
        .bind(&link.icon)
        .bind(link.order)
        .execute(&mut *conn)
        .await
        .context("Failed to insert social link")?;
    }
    Ok(())
}

async fn write_hero_slides(
    conn: &mut SqliteConnection,
    profile_id: i64,
    input: &ClubInput,
) -> Result<()> {
    for slide in &input.hero_slides {
        sqlx::query(
            "INSERT INTO hero_slides (profile_id, title, subtitle, image, sort_order) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(profile_id)
        .bind(&slide.title)
        .bind(&slide.subtitle)
        .bind(&slide.image)
        .bind(slide.order)
        .execute(&mut *conn)
        .await
        .context("Failed to insert hero slide")?;
    }
    Ok(())
}

fn row_to_contact(row: &sqlx::sqlite::SqliteRow) -> Result<ContactInfo> {
    Ok(ContactInfo {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        phone_primary: row.try_get("phone_primary")?,
        phone_secondary: row.try_get("phone_secondary")?,
        email: row.try_get("email")?,
        address: row.try_get("address")?,
        map_url: row.try_get("map_url")?,
        working_hours: row.try_get("working_hours")?,
        whatsapp: row.try_get("whatsapp")?,
        telegram: row.try_get("telegram")?,
        instagram: row.try_get("instagram")?,
        youtube: row.try_get("youtube")?,
        vk: row.try_get("vk")?,
        social_links: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_club(row: &sqlx::sqlite::SqliteRow) -> Result<ClubProfile> {
    Ok(ClubProfile {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        tagline: row.try_get("tagline")?,
        mission: row.try_get("mission")?,
        story: row.try_get("story")?,
        founded_year: row.try_get("founded_year")?,
        hero_video: row.try_get("hero_video")?,
        hero_description: row.try_get("hero_description")?,
        seo_title: row.try_get("seo_title")?,
        seo_description: row.try_get("seo_description")?,
        hero_slides: Vec::new(),
        updated_at: row.try_get("updated_at")?,
    })
}
