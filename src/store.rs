use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::{entities::movie, error::AppResult};

#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn insert(
        &self,
        title: &str,
        description: &str,
        poster: &str,
    ) -> AppResult<movie::Model> {
        let model = movie::ActiveModel {
            id: Default::default(),
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            poster: Set(poster.to_string()),
            created_at: Set(now_sec()),
        };

        let movie = model.insert(&self.db).await?;
        tracing::info!(movie_id = movie.id, poster = %movie.poster, "movie stored");
        Ok(movie)
    }

    /// All movies in insertion order.
    pub async fn list_all(&self) -> AppResult<Vec<movie::Model>> {
        let movies = movie::Entity::find().order_by_asc(movie::Column::Id).all(&self.db).await?;
        Ok(movies)
    }
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn store(dir: &tempfile::TempDir) -> MovieStore {
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        MovieStore::new(db::connect_and_migrate(&url).await.unwrap())
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let first = store.insert("Alien", "Space horror", "alien.png").await.unwrap();
        let second = store.insert("Heat", "Crime", "heat.jpg").await.unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.title, "Alien");
        assert_eq!(first.poster, "alien.png");
        assert!(first.created_at > 0);
    }

    #[tokio::test]
    async fn list_is_in_insertion_order_and_stable() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        assert!(store.list_all().await.unwrap().is_empty());

        for (title, poster) in [("Heat", "heat.jpg"), ("Alien", "alien.png"), ("Ran", "ran.png")] {
            store.insert(title, "desc", poster).await.unwrap();
        }

        let once = store.list_all().await.unwrap();
        let twice = store.list_all().await.unwrap();
        let titles = once.iter().map(|m| m.title.as_str()).collect::<Vec<_>>();

        assert_eq!(titles, ["Heat", "Alien", "Ran"]);
        assert_eq!(once, twice);
    }
}
