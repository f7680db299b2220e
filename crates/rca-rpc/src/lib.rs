// crates/rca-rpc/src/lib.rs
//
// rca-rpc: JSON-RPC server and handlers for the RCA generation service.
//
// A single tonic unary service accepts JSON-encoded `{method, params}`
// requests and dispatches them to the handler modules. No proto codegen.

pub mod handlers;
pub mod middleware;
pub mod server;

// Re-export the main server type for ergonomic access.
pub use server::{JsonRpcRequest, JsonRpcResponse, RcaRpcServer, RpcConfig, RPC_PATH};

#[cfg(test)]
mod test_support;
