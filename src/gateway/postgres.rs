use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{Entity, Fields, Filter, Gateway, GatewayResult, Value, ID_COLUMN};

/// Gateway over one Postgres table. Every statement checks a connection out
/// of the pool and hands it back when the statement finishes or fails.
pub struct PgGateway<E> {
    db: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PgGateway<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> PgGateway<E> {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

fn select_list<E: Entity>() -> String {
    std::iter::once(ID_COLUMN)
        .chain(E::COLUMNS.iter().copied())
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: Value) {
    match value {
        Value::Int(v) => qb.push_bind(v),
        Value::Bool(v) => qb.push_bind(v),
        Value::Text(v) => qb.push_bind(v),
    };
}

fn select_by_id<E: Entity>() -> String {
    format!("SELECT {} FROM {} WHERE id = $1", select_list::<E>(), E::TABLE)
}

fn list_query<'a, E: Entity>(offset: i64, limit: i64, filters: &[Filter]) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM {}", select_list::<E>(), E::TABLE));
    let mut first = true;
    for filter in filters {
        let Some(column) = E::column(&filter.field) else {
            debug!(table = E::TABLE, field = %filter.field, "ignoring unknown filter");
            continue;
        };
        qb.push(if first { " WHERE " } else { " AND " });
        qb.push(column).push(" = ");
        push_value(&mut qb, filter.value.clone());
        first = false;
    }
    qb.push(" ORDER BY id LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    qb
}

fn insert_query<'a, E: Entity>(fields: Fields) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("INSERT INTO {}", E::TABLE));
    if fields.is_empty() {
        qb.push(" DEFAULT VALUES");
    } else {
        let columns: Vec<&str> = fields.iter().map(|(c, _)| c).collect();
        qb.push(format!(" ({}) VALUES (", columns.join(", ")));
        for (i, (_, value)) in fields.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value);
        }
        qb.push(")");
    }
    qb.push(format!(" RETURNING {}", select_list::<E>()));
    qb
}

/// Caller guarantees `fields` is non-empty.
fn update_query<'a, E: Entity>(id: i64, fields: Fields) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", E::TABLE));
    for (i, (column, value)) in fields.into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(column).push(" = ");
        push_value(&mut qb, value);
    }
    qb.push(" WHERE id = ")
        .push_bind(id)
        .push(format!(" RETURNING {}", select_list::<E>()));
    qb
}

#[async_trait]
impl<E: Entity> Gateway<E> for PgGateway<E> {
    async fn get(&self, id: i64) -> GatewayResult<Option<E>> {
        let sql = select_by_id::<E>();
        let row = sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn list(&self, offset: i64, limit: i64, filters: &[Filter]) -> GatewayResult<Vec<E>> {
        let mut qb = list_query::<E>(offset, limit, filters);
        let rows = qb.build_query_as::<E>().fetch_all(&self.db).await?;
        Ok(rows)
    }

    async fn create(&self, fields: Fields) -> GatewayResult<E> {
        E::check_writable(&fields)?;
        let mut qb = insert_query::<E>(fields);
        let row = qb.build_query_as::<E>().fetch_one(&self.db).await?;
        debug!(table = E::TABLE, id = row.id(), "row inserted");
        Ok(row)
    }

    async fn update(&self, id: i64, fields: Fields) -> GatewayResult<Option<E>> {
        E::check_writable(&fields)?;
        if fields.is_empty() {
            return self.get(id).await;
        }
        let mut qb = update_query::<E>(id, fields);
        let row = qb.build_query_as::<E>().fetch_optional(&self.db).await?;
        Ok(row)
    }

    async fn delete(&self, id: i64) -> GatewayResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", E::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }
}
