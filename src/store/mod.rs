//! Narrow persistence contracts over the relational store.
//!
//! The core consumes the store only as "find matching X", "persist", and
//! "delete". Queries are raw SQL with tracing spans; schema migrations are
//! owned elsewhere. Correctness under concurrent requests rests on the
//! store's transactional guarantees, not on in-process locking.

pub mod email_code;
pub mod person;
pub mod reset;

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
