//! Write-side entry point: a unit of work batching inserts, updates and
//! deletes.
//!
//! Records queue up in FIFO order and nothing touches the database until
//! [`Session::commit`]. Each pending operation becomes one parameterized
//! statement committed on its own; a failure rolls that statement back,
//! keeps it (and everything after it) in the queue, and propagates the
//! error. Earlier statements of the same batch stay applied.

use std::collections::VecDeque;
use std::sync::Arc;

use minorm_core::{OrmError, OrmResult};

use crate::executor::DbExecutor;
use crate::schema::Record;
use crate::value::Value;

/// What a queued record should become on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Insert,
    Update,
    Delete,
}

/// One queued write.
#[derive(Debug)]
pub struct PendingOp {
    pub kind: OpKind,
    pub record: Record,
}

/// A unit of work over one executor.
pub struct Session {
    db: Arc<dyn DbExecutor>,
    pending: VecDeque<PendingOp>,
}

impl Session {
    pub fn new(db: Arc<dyn DbExecutor>) -> Self {
        Self {
            db,
            pending: VecDeque::new(),
        }
    }

    /// Queues a record for persistence. Records read from the database
    /// become UPDATEs, fresh records become INSERTs.
    pub fn add(&mut self, record: Record) {
        let kind = if record.read_from_db() {
            OpKind::Update
        } else {
            OpKind::Insert
        };
        tracing::debug!(table = record.schema().table(), ?kind, "queueing write");
        self.pending.push_back(PendingOp { kind, record });
    }

    /// Queues several records; equivalent to calling [`Session::add`] on
    /// each in order.
    pub fn add_all(&mut self, records: impl IntoIterator<Item = Record>) {
        for record in records {
            self.add(record);
        }
    }

    /// Queues a record for deletion.
    pub fn remove(&mut self, record: Record) {
        tracing::debug!(table = record.schema().table(), "queueing delete");
        self.pending.push_back(PendingOp {
            kind: OpKind::Delete,
            record,
        });
    }

    /// Drops every queued operation without touching the database.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Returns the number of queued operations.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Flushes the queue in FIFO order, one committed statement per
    /// operation.
    ///
    /// Returns the persisted records (inserts with database-assigned
    /// primary keys written back, updates with their dirty flags reset);
    /// deleted records are dropped.
    ///
    /// # Errors
    ///
    /// Propagates the first statement failure after rolling it back. The
    /// failed operation and everything queued behind it remain in the
    /// queue; statements committed before the failure stay applied.
    pub async fn commit(&mut self) -> OrmResult<Vec<Record>> {
        let mut persisted = Vec::new();
        while let Some(op) = self.pending.pop_front() {
            match self.apply(op).await {
                Ok(Some(record)) => persisted.push(record),
                Ok(None) => {}
                Err((op, err)) => {
                    self.pending.push_front(op);
                    return Err(err);
                }
            }
        }
        Ok(persisted)
    }

    /// Inserts several fresh records as one multi-row statement, committed
    /// immediately. The pending queue is not involved.
    ///
    /// # Errors
    ///
    /// Returns an error if the records span more than one table or any of
    /// them originated from a database read, or if the statement fails.
    pub async fn bulk_insert(&self, records: &[Record]) -> OrmResult<u64> {
        let Some(first) = records.first() else {
            return Ok(0);
        };
        let schema = first.schema();
        for record in records {
            if !Arc::ptr_eq(record.schema(), schema) {
                return Err(OrmError::ImproperlyConfigured(
                    "bulk insert requires records of a single table".to_string(),
                ));
            }
            if record.read_from_db() {
                return Err(OrmError::ImproperlyConfigured(
                    "bulk insert only accepts fresh records".to_string(),
                ));
            }
        }
        let columns = schema.column_names();
        let rows: Vec<Vec<Value>> = records
            .iter()
            .map(|r| r.field_values().into_iter().map(|(_, v)| v).collect())
            .collect();
        let (sql, params) = self
            .db
            .compiler()
            .insert_many(schema.table(), &columns, &rows);
        tracing::debug!(sql = %sql, rows = records.len(), "executing bulk insert");
        self.db.begin().await?;
        match self.db.execute(&sql, &params).await {
            Ok(affected) => {
                self.finish_statement().await?;
                Ok(affected)
            }
            Err(err) => {
                self.roll_back().await;
                Err(err)
            }
        }
    }

    async fn apply(&self, op: PendingOp) -> Result<Option<Record>, (PendingOp, OrmError)> {
        let result = match op.kind {
            OpKind::Insert => self.apply_insert(op.record.clone()).await.map(Some),
            OpKind::Update => self.apply_update(op.record.clone()).await.map(Some),
            OpKind::Delete => self.apply_delete(&op.record).await.map(|()| None),
        };
        result.map_err(|err| (op, err))
    }

    async fn apply_insert(&self, mut record: Record) -> OrmResult<Record> {
        let values = record.field_values();
        let (sql, params) = self.db.compiler().insert(record.schema().table(), &values);
        tracing::debug!(sql = %sql, "executing insert");

        let needs_pk = record
            .schema()
            .primary_key()
            .is_some_and(|pk| pk.auto_increment)
            && record.pk().is_some_and(|(_, v)| v.is_null());

        self.db.begin().await?;
        let outcome = if needs_pk {
            self.db
                .insert_returning_id(&sql, &params)
                .await
                .map(|id| record.write_back_pk(id))
        } else {
            self.db.execute(&sql, &params).await.map(|_| ())
        };
        match outcome {
            Ok(()) => {
                self.finish_statement().await?;
                record.mark_persisted();
                Ok(record)
            }
            Err(err) => {
                self.roll_back().await;
                Err(err)
            }
        }
    }

    async fn apply_update(&self, mut record: Record) -> OrmResult<Record> {
        let pk_name = record.pk().map(|(name, _)| name);
        let mut set = record.dirty_fields();
        if set.is_empty() {
            set = record
                .field_values()
                .into_iter()
                .filter(|(name, _)| Some(*name) != pk_name)
                .collect();
        }
        // Rows are matched by the primary key when the schema declares
        // one; schemas without a primary key match on every field left
        // unassigned since the read.
        let where_eq = match record.pk() {
            Some((name, value)) if !value.is_null() => vec![(name, value.clone())],
            Some((name, _)) => {
                return Err(OrmError::ImproperlyConfigured(format!(
                    "cannot update '{}': primary key '{name}' has no value",
                    record.schema().table()
                )))
            }
            None => record.unchanged_fields(),
        };
        if set.is_empty() || where_eq.is_empty() {
            return Err(OrmError::ImproperlyConfigured(format!(
                "cannot update '{}': nothing to set or no fields to match on",
                record.schema().table()
            )));
        }
        let (sql, params) = self
            .db
            .compiler()
            .update(record.schema().table(), &set, &where_eq);
        tracing::debug!(sql = %sql, "executing update");
        self.db.begin().await?;
        match self.db.execute(&sql, &params).await {
            Ok(_) => {
                self.finish_statement().await?;
                record.mark_persisted();
                Ok(record)
            }
            Err(err) => {
                self.roll_back().await;
                Err(err)
            }
        }
    }

    async fn apply_delete(&self, record: &Record) -> OrmResult<()> {
        let where_eq = record.field_values();
        let (sql, params) = self
            .db
            .compiler()
            .delete(record.schema().table(), &where_eq);
        tracing::debug!(sql = %sql, "executing delete");
        self.db.begin().await?;
        match self.db.execute(&sql, &params).await {
            Ok(_) => self.finish_statement().await,
            Err(err) => {
                self.roll_back().await;
                Err(err)
            }
        }
    }

    // A failed COMMIT must not leave the connection inside an open
    // transaction; the next statement's BEGIN would be rejected.
    async fn finish_statement(&self) -> OrmResult<()> {
        if let Err(err) = self.db.commit().await {
            self.roll_back().await;
            return Err(err);
        }
        Ok(())
    }

    async fn roll_back(&self) {
        if let Err(err) = self.db.rollback().await {
            tracing::warn!(error = %err, "rollback failed");
        }
    }
}
