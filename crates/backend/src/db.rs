use diesel::prelude::*;
use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager, ManagerConfig},
    AsyncPgConnection, RunQueryDsl,
};
use uuid::Uuid;

pub type DbPool = Pool<AsyncPgConnection>;

async fn establish_tls_connection(config: String) -> diesel::ConnectionResult<AsyncPgConnection> {
    // Set up rustls TLS configuration
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

    let (client, connection) = tokio_postgres::connect(&config, tls)
        .await
        .map_err(|e| diesel::ConnectionError::BadConnection(e.to_string()))?;

    // The connection object drives the socket; it has to be polled on its own task
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    AsyncPgConnection::try_from(client).await
}

/// Build the connection pool. `tls` switches to a rustls-backed connector,
/// which hosted Postgres providers usually require.
pub fn establish_connection_pool(database_url: &str, tls: bool) -> anyhow::Result<DbPool> {
    let manager = if tls {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup =
            Box::new(|url| Box::pin(establish_tls_connection(url.to_string())));
        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
            database_url,
            manager_config,
        )
    } else {
        AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url)
    };

    let pool = Pool::builder(manager).build()?;

    Ok(pool)
}

// User database operations
pub mod users {
    use super::*;
    use shared_types::User;

    use crate::models::NewUser;

    pub async fn get_by_id(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
    ) -> anyhow::Result<Option<User>> {
        use crate::schema::users::dsl::*;

        let user = users
            .filter(id.eq(user_id))
            .first::<User>(conn)
            .await
            .optional()?;

        Ok(user)
    }

    pub async fn get_by_uid(
        conn: &mut AsyncPgConnection,
        provider_uid: &str,
    ) -> anyhow::Result<Option<User>> {
        use crate::schema::users::dsl::*;

        let user = users
            .filter(uid.eq(provider_uid))
            .first::<User>(conn)
            .await
            .optional()?;

        Ok(user)
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        provider_uid: &str,
        display_name: &str,
    ) -> anyhow::Result<User> {
        use crate::schema::users::dsl::*;

        let new_user = diesel::insert_into(users)
            .values(NewUser {
                id: Uuid::new_v4(),
                uid: provider_uid,
                name: display_name,
            })
            .get_result::<User>(conn)
            .await?;

        Ok(new_user)
    }
}

// Entry database operations
pub mod entries {
    use super::*;
    use chrono::Utc;
    use diesel::upsert::excluded;
    use shared_types::Entry;

    use crate::models::NewEntry;
    use crate::schema::entries::dsl;

    pub async fn find(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        day: &str,
    ) -> anyhow::Result<Option<Entry>> {
        let entry = dsl::entries
            .filter(dsl::user_id.eq(owner))
            .filter(dsl::date.eq(day))
            .first::<Entry>(conn)
            .await
            .optional()?;

        Ok(entry)
    }

    pub async fn find_by_date_range(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        from: Option<&str>,
        to: Option<&str>,
    ) -> anyhow::Result<Vec<Entry>> {
        let mut query = dsl::entries.filter(dsl::user_id.eq(owner)).into_boxed();
        if let Some(from) = from {
            query = query.filter(dsl::date.ge(from.to_string()));
        }
        if let Some(to) = to {
            query = query.filter(dsl::date.le(to.to_string()));
        }

        let items = query.order_by(dsl::date.asc()).load::<Entry>(conn).await?;

        Ok(items)
    }

    /// Replace the body of the (user, date) entry, inserting it if absent.
    pub async fn upsert(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        day: &str,
        text: &str,
    ) -> anyhow::Result<Entry> {
        let entry = diesel::insert_into(dsl::entries)
            .values(NewEntry {
                id: Uuid::new_v4(),
                user_id: owner,
                date: day,
                body: text,
            })
            .on_conflict((dsl::user_id, dsl::date))
            .do_update()
            .set((
                dsl::body.eq(excluded(dsl::body)),
                dsl::updated_at.eq(Utc::now()),
            ))
            .get_result::<Entry>(conn)
            .await?;

        Ok(entry)
    }
}
