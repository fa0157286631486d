// routes/suite.rs - The suite's client-facing surface
//
// Browser calls arrive under /api. JSON services own their own path space
// without the /api prefix; pdf-tools serves its operations at the root.

use axum::http::Method;

use super::{MethodFilter, RouteEntry, RouteTable, RouteTableError, Upstream};
use crate::config::UpstreamConfig;

const API_PREFIX: &str = "/api";
const PDF_TOOLS_PREFIX: &str = "/api/pdf-tools";

pub fn suite_routes(upstreams: &UpstreamConfig) -> Result<RouteTable, RouteTableError> {
    use Method as M;

    let auth = Upstream::new("auth-service", &upstreams.auth);
    let notes = Upstream::new("notes-service", &upstreams.notes);
    let whiteboards = Upstream::new("whiteboard-service", &upstreams.whiteboards);
    let tasks = Upstream::new("tasks-service", &upstreams.tasks);
    let pdf_tools = Upstream::new("pdf-tools", &upstreams.pdf_tools);

    let only = |methods: &[Method]| MethodFilter::Only(methods.to_vec());
    let json = |methods: &[Method], pattern: &str, upstream: &std::sync::Arc<Upstream>| {
        RouteEntry::new(only(methods), pattern, upstream.clone()).map(|e| e.strip_prefix(API_PREFIX))
    };

    let entries = vec![
        // Public: token acquisition
        json(&[M::POST], "/api/auth/login", &auth)?.public(),
        json(&[M::POST], "/api/auth/register", &auth)?.public(),
        // Notes
        json(&[M::GET, M::POST], "/api/notes", &notes)?,
        json(&[M::GET, M::PUT, M::DELETE], "/api/notes/:id", &notes)?,
        // Whiteboards
        json(&[M::GET, M::POST], "/api/whiteboards", &whiteboards)?,
        json(&[M::GET, M::PUT, M::DELETE], "/api/whiteboards/:id", &whiteboards)?,
        // Task boards
        json(&[M::GET], "/api/board", &tasks)?,
        json(&[M::POST], "/api/tasks", &tasks)?,
        json(&[M::PUT, M::DELETE], "/api/tasks/:id", &tasks)?,
        json(&[M::PUT], "/api/tasks/:id/move", &tasks)?,
        json(&[M::POST], "/api/tasks/:id/checklist", &tasks)?,
        json(&[M::POST], "/api/tasks/:id/comments", &tasks)?,
        json(&[M::POST], "/api/lists", &tasks)?,
        json(&[M::PUT, M::DELETE], "/api/lists/:id", &tasks)?,
        json(&[M::PUT], "/api/checklist/:itemId", &tasks)?,
        // PDF tools: multipart in, binary out
        RouteEntry::new(MethodFilter::Any, "/api/pdf-tools/*", pdf_tools)?
            .strip_prefix(PDF_TOOLS_PREFIX)
            .stream(),
    ];

    RouteTable::new(entries)
}
