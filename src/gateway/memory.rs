use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Entity, Fields, Filter, Gateway, GatewayError, GatewayResult};

struct Table<E> {
    next_id: i64,
    rows: BTreeMap<i64, E>,
}

impl<E: Entity> Table<E> {
    /// Unique columns of `candidate` that collide with another row.
    fn check_unique(&self, candidate: &E) -> GatewayResult<()> {
        for column in E::UNIQUE {
            let value = candidate.get(column);
            let taken = self
                .rows
                .values()
                .any(|row| row.id() != candidate.id() && row.get(column) == value);
            if taken {
                return Err(GatewayError::UniqueViolation {
                    constraint: format!("{}_{}_key", E::TABLE, column),
                });
            }
        }
        Ok(())
    }
}

/// In-process table keyed by a monotonically increasing id.
///
/// Every mutation runs under the write lock, so unique-column checks and the
/// write they guard are atomic.
#[derive(Clone)]
pub struct MemoryGateway<E> {
    table: Arc<RwLock<Table<E>>>,
}

impl<E: Entity> MemoryGateway<E> {
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table {
                next_id: 1,
                rows: BTreeMap::new(),
            })),
        }
    }
}

impl<E: Entity> Default for MemoryGateway<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Entity> Gateway<E> for MemoryGateway<E> {
    async fn get(&self, id: i64) -> GatewayResult<Option<E>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn list(&self, offset: i64, limit: i64, filters: &[Filter]) -> GatewayResult<Vec<E>> {
        let known: Vec<(&'static str, &Filter)> = filters
            .iter()
            .filter_map(|f| match E::column(&f.field) {
                Some(column) => Some((column, f)),
                None => {
                    debug!(table = E::TABLE, field = %f.field, "ignoring unknown filter");
                    None
                }
            })
            .collect();

        let table = self.table.read().await;
        let rows = table
            .rows
            .values()
            .filter(|row| {
                known
                    .iter()
                    .all(|(column, f)| row.get(column).as_ref() == Some(&f.value))
            })
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn create(&self, fields: Fields) -> GatewayResult<E> {
        E::check_writable(&fields)?;
        let mut table = self.table.write().await;
        let row = E::from_fields(table.next_id, &fields)?;
        table.check_unique(&row)?;
        table.next_id += 1;
        table.rows.insert(row.id(), row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, fields: Fields) -> GatewayResult<Option<E>> {
        E::check_writable(&fields)?;
        let mut table = self.table.write().await;
        let Some(mut row) = table.rows.get(&id).cloned() else {
            return Ok(None);
        };
        for (column, value) in fields {
            row.set(column, value)?;
        }
        table.check_unique(&row)?;
        table.rows.insert(id, row.clone());
        Ok(Some(row))
    }

    async fn delete(&self, id: i64) -> GatewayResult<bool> {
        let mut table = self.table.write().await;
        Ok(table.rows.remove(&id).is_some())
    }
}
