use chrono::{Duration, Utc};
use common::Category;
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Set};
use tracing::info;
use uuid::Uuid;

use crate::entity::{image_file, portfolio};
use crate::utils::query::SEARCH_DOCUMENT;

/// `array_to_string` is only STABLE, so index expressions need this wrapper
/// declared IMMUTABLE.
const SEARCH_TEXT_FUNCTION: &str = "\
    CREATE OR REPLACE FUNCTION portfolio_search_text(title text, description text, tags text[]) \
    RETURNS text LANGUAGE sql IMMUTABLE PARALLEL SAFE \
    AS $$ SELECT title || ' ' || description || ' ' || array_to_string(tags, ' ') $$";

struct SeedEntry {
    title: &'static str,
    description: &'static str,
    image: &'static str,
    url: Option<&'static str>,
    category: Category,
    tags: &'static [&'static str],
    featured: bool,
}

/// Entries inserted into an empty table on first start.
const DEFAULT_PORTFOLIOS: &[SeedEntry] = &[
    SeedEntry {
        title: "E-Commerce Platform",
        description: "Full-stack online store with product search, cart, checkout and an \
            admin dashboard for inventory and order management.",
        image: "ecommerce.jpg",
        url: Some("https://example.com/shop"),
        category: Category::WebDevelopment,
        tags: &["React", "Node.js", "PostgreSQL", "Stripe"],
        featured: true,
    },
    SeedEntry {
        title: "AI Customer Support Chatbot",
        description: "Conversational assistant that answers product questions from a \
            knowledge base and hands off to human agents when confidence is low.",
        image: "chatbot.jpg",
        url: None,
        category: Category::AiMl,
        tags: &["Python", "NLP", "LLM", "FastAPI"],
        featured: true,
    },
    SeedEntry {
        title: "Fitness Tracking App",
        description: "Cross-platform mobile app for logging workouts, tracking goals and \
            syncing health data with wearable devices.",
        image: "fitness.jpg",
        url: None,
        category: Category::MobileApp,
        tags: &["Flutter", "Firebase", "HealthKit"],
        featured: false,
    },
    SeedEntry {
        title: "Sales Analytics Dashboard",
        description: "Interactive dashboard aggregating sales data from several sources \
            with forecasting and scheduled reports.",
        image: "analytics.jpg",
        url: Some("https://example.com/analytics"),
        category: Category::DataAnalytics,
        tags: &["Python", "Pandas", "React", "D3.js"],
        featured: false,
    },
    SeedEntry {
        title: "Kubernetes Deployment Pipeline",
        description: "GitOps pipeline that builds, scans and deploys containerized \
            services to multiple clusters with automated rollbacks.",
        image: "devops.jpg",
        url: None,
        category: Category::CloudDevOps,
        tags: &["Kubernetes", "Terraform", "GitHub Actions"],
        featured: false,
    },
];

/// Insert the default showcase entries when the table is empty.
///
/// Returns the number of entries inserted.
pub async fn seed_portfolios(db: &DatabaseConnection) -> Result<u64, DbErr> {
    if portfolio::Entity::find().count(db).await? > 0 {
        return Ok(0);
    }

    let now = Utc::now();
    let models = DEFAULT_PORTFOLIOS.iter().enumerate().map(|(i, entry)| {
        // Stagger creation times so "newest" has a stable order.
        let created_at = now - Duration::minutes(i as i64);
        portfolio::ActiveModel {
            id: Set(Uuid::now_v7()),
            title: Set(entry.title.to_string()),
            description: Set(entry.description.to_string()),
            image: Set(Some(entry.image.to_string())),
            image_id: Set(None),
            image_base64: Set(None),
            url: Set(entry.url.map(str::to_string)),
            category: Set(entry.category),
            tags: Set(entry.tags.iter().map(|&t| t.to_owned()).collect()),
            featured: Set(entry.featured),
            views: Set(0),
            likes: Set(0),
            created_at: Set(created_at),
            updated_at: Set(created_at),
        }
    });

    portfolio::Entity::insert_many(models)
        .exec_without_returning(db)
        .await?;

    let inserted = DEFAULT_PORTFOLIOS.len() as u64;
    info!("Seeded {} default portfolio entries", inserted);
    Ok(inserted)
}

/// Ensure the search function and required database indexes exist.
///
/// SeaORM's schema-sync doesn't create expression or composite non-unique
/// indexes, so they are created manually on startup. Listing queries call the
/// search function, so failing to create it is an error.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute_unprepared(SEARCH_TEXT_FUNCTION).await?;

    let statements = [
        (
            "idx_portfolio_search",
            format!(
                "CREATE INDEX IF NOT EXISTS idx_portfolio_search ON portfolio \
                 USING GIN ({SEARCH_DOCUMENT})"
            ),
        ),
        (
            "idx_portfolio_featured_created",
            Index::create()
                .if_not_exists()
                .name("idx_portfolio_featured_created")
                .table(portfolio::Entity)
                .col(portfolio::Column::Featured)
                .col(portfolio::Column::CreatedAt)
                .to_string(PostgresQueryBuilder),
        ),
        (
            "idx_image_file_content_hash",
            Index::create()
                .if_not_exists()
                .name("idx_image_file_content_hash")
                .table(image_file::Entity)
                .col(image_file::Column::ContentHash)
                .to_string(PostgresQueryBuilder),
        ),
    ];

    for (name, stmt) in statements {
        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
