// crates/rca-rpc/src/middleware.rs
//
// Request interceptor for the RPC server.

use tonic::{Request, Status};

/// Logs the metadata of each incoming request.
pub fn logging_interceptor(req: Request<()>) -> Result<Request<()>, Status> {
    tracing::debug!("Incoming RPC request: {:?}", req.metadata());
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_requests_through() {
        let mut req = Request::new(());
        req.metadata_mut()
            .insert("x-request-id", "abc".parse().unwrap());
        let out = logging_interceptor(req).unwrap();
        assert_eq!(out.metadata().get("x-request-id").unwrap(), "abc");
    }
}
