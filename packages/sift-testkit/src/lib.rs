//! Throwaway Postgres databases and Qdrant collections for integration tests.
//!
//! Tests that need live services are gated on `SIFT_PG_DSN` and `SIFT_QDRANT_URL`.

mod error;
mod fixtures;

pub use error::{Error, Result};
pub use fixtures::{
	IndexDocument, SeedCategory, SeedProduct, create_index_collection, index_documents, point_id,
	seed_categories, seed_products,
};

use std::{env, str::FromStr, sync::Mutex, thread, time::Duration};

use qdrant_client::Qdrant;
use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];
const QDRANT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

pub fn env_dsn() -> Option<String> {
	env::var("SIFT_PG_DSN").ok()
}

pub fn env_qdrant_url() -> Option<String> {
	env::var("SIFT_QDRANT_URL").ok()
}

/// A database created for one test and dropped when the test is done, together with every
/// collection handed out by [`TestDatabase::collection_name`].
pub struct TestDatabase {
	name: String,
	dsn: String,
	admin_options: PgConnectOptions,
	collections: Mutex<Vec<String>>,
	cleaned: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base_options = PgConnectOptions::from_str(base_dsn)
			.map_err(Error::InvalidDsn)?;
		let (admin_options, mut admin_conn) = connect_admin(&base_options).await?;
		let name = format!("sift_test_{}", Uuid::new_v4().simple());

		admin_conn
			.execute(format!(r#"CREATE DATABASE "{name}""#).as_str())
			.await
			.map_err(|source| Error::Database { database: name.clone(), action: "create", source })?;

		let dsn = base_options.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin_options, collections: Mutex::new(Vec::new()), cleaned: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	/// A collection name unique to this database. It is deleted on cleanup.
	pub fn collection_name(&self, prefix: &str) -> String {
		let collection = format!("{prefix}_{}", self.name);
		let mut tracked = self.collections.lock().unwrap_or_else(|err| err.into_inner());

		if !tracked.contains(&collection) {
			tracked.push(collection.clone());
		}

		collection
	}

	pub async fn cleanup(mut self) -> Result<()> {
		let collections = self.tracked_collections();
		let qdrant = drop_collections(&collections).await;

		drop_database(&self.name, &self.admin_options).await?;
		qdrant?;

		self.cleaned = true;

		Ok(())
	}

	fn tracked_collections(&self) -> Vec<String> {
		self.collections.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let name = self.name.clone();
		let admin_options = self.admin_options.clone();
		let collections = self.tracked_collections();
		// A panicking test still owns a runtime on this thread, so cleanup runs on its own.
		let handle = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test cleanup failed to start a runtime: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(drop_collections(&collections)) {
				eprintln!("Test Qdrant cleanup failed: {err}.");
			}
			if let Err(err) = runtime.block_on(drop_database(&name, &admin_options)) {
				eprintln!("Test database cleanup failed: {err}.");
			}
		});

		let _ = handle.join();
	}
}

async fn connect_admin(
	base_options: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		let options = base_options.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error::AdminUnavailable {
		last_error: last_err.map(|err| err.to_string()).unwrap_or_default(),
	})
}

async fn drop_database(name: &str, admin_options: &PgConnectOptions) -> Result<()> {
	let mut conn =
		PgConnection::connect_with(admin_options).await.map_err(|source| Error::Database {
			database: name.to_string(),
			action: "reach the admin database to drop",
			source,
		})?;
	let _ = sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.fetch_all(&mut conn)
	.await;

	sqlx::query(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str())
		.execute(&mut conn)
		.await
		.map_err(|source| Error::Database { database: name.to_string(), action: "drop", source })?;

	Ok(())
}

async fn drop_collections(collections: &[String]) -> Result<()> {
	if collections.is_empty() {
		return Ok(());
	}

	let Some(url) = env_qdrant_url() else {
		eprintln!("Skipping Qdrant cleanup; set SIFT_QDRANT_URL to delete test collections.");

		return Ok(());
	};
	let client = Qdrant::from_url(&url).build()?;

	for collection in collections {
		let exists = tokio::time::timeout(
			QDRANT_CALL_TIMEOUT,
			client.collection_exists(collection.as_str()),
		)
		.await
		.map_err(|_| Error::QdrantTimeout {
			operation: "collection_exists",
			collection: collection.clone(),
		})??;

		if !exists {
			continue;
		}

		tokio::time::timeout(QDRANT_CALL_TIMEOUT, client.delete_collection(collection.clone()))
			.await
			.map_err(|_| Error::QdrantTimeout {
				operation: "delete_collection",
				collection: collection.clone(),
			})??;
	}

	Ok(())
}
