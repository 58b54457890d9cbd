//! Shared helpers for the catalog workspace: logging setup, runtime
//! directory checks and the JSON envelope used by every HTTP response.

pub mod types;
pub mod utils;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }
}
