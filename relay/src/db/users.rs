use super::schema::InsertPlan;
use super::DbPool;

/// Id of the user with this email, as text.
pub async fn find_user_id(pool: &DbPool, email: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(r#"SELECT id::text FROM "user" WHERE email = $1"#)
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Runs a planned insert, returning the number of rows written.
pub async fn insert_user(pool: &DbPool, plan: &InsertPlan) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&plan.sql);
    for value in &plan.binds {
        query = query.bind(value);
    }
    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}
