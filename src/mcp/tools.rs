// MCP Tools implementation using official rmcp SDK

use rmcp::{
    ErrorData as McpError,
    model::*,
    tool, tool_router,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
};
use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use tracing::{debug, info};

use crate::error::FolderError;
use crate::storage::StorageState;
use crate::mcp::api;

/// Folder tree MCP server - provides tools for folders, projects, and search
#[derive(Clone)]
pub struct FolderTreeServer {
    pub storage: StorageState,
    tool_router: ToolRouter<Self>,
}

impl FolderTreeServer {
    pub fn new(storage: StorageState) -> Self {
        Self {
            storage,
            tool_router: Self::tool_router(),
        }
    }
}

const INSTRUCTIONS: &str = "Project folders MCP server - organize projects into a nested folder tree";

// Implement ServerHandler - delegates tool calls to the tool_router
impl rmcp::handler::server::ServerHandler for FolderTreeServer {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        let mut info = rmcp::model::ServerInfo::default();
        info.capabilities.tools = Some(rmcp::model::ToolsCapability {
            list_changed: Some(false),
        });
        info.server_info.name = "project-folders".into();
        info.server_info.version = env!("CARGO_PKG_VERSION").into();
        info.instructions = Some(INSTRUCTIONS.into());
        info
    }

    fn initialize(
        &self,
        _request: rmcp::model::InitializeRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<rmcp::model::InitializeResult, McpError>> + Send + '_ {
        async move {
            info!("[MCP] Initialize called");
            Ok(rmcp::handler::server::ServerHandler::get_info(self))
        }
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<rmcp::model::ListToolsResult, McpError>> + Send + '_ {
        async move {
            let tools = self.tool_router.list_all();
            debug!("[MCP] list_tools called, found {} tools", tools.len());
            Ok(rmcp::model::ListToolsResult {
                tools,
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: rmcp::model::CallToolRequestParam,
        context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let tool_context = rmcp::handler::server::tool::ToolCallContext::new(self, request, context);
            self.tool_router.call(tool_context).await
        }
    }
}

// ============================================
// Result helpers
// ============================================

/// Caller mistakes become invalid_params; everything else is an internal error
fn toMcpError(e: FolderError) -> McpError {
    match e {
        FolderError::NotFound(_)
        | FolderError::Collision(_)
        | FolderError::CyclicMove { .. }
        | FolderError::InvalidName(_)
        | FolderError::NotAFolder(_)
        | FolderError::NotAProject(_) => McpError::invalid_params(e.to_string(), None),
        _ => McpError::internal_error(e.to_string(), None),
    }
}

fn jsonResult<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================
// Tool Input Types
// ============================================

#[derive(Deserialize, JsonSchema)]
pub struct FolderPathInput {
    #[serde(rename = "folderPath")]
    pub folder_path: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub struct CreateInput {
    pub name: String,
    #[serde(rename = "parentPath")]
    pub parent_path: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub struct RenameFolderInput {
    pub path: String,
    #[serde(rename = "newName")]
    pub new_name: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct MoveInput {
    pub path: String,
    /// Destination folder; omit to move to the root
    #[serde(rename = "targetPath")]
    pub target_path: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub struct DeleteFolderInput {
    pub path: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct SearchInput {
    pub query: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct ExpandInput {
    pub path: String,
    pub expanded: bool,
}

// ============================================
// Tool Implementations
// ============================================

#[tool_router]
impl FolderTreeServer {
    // --- Tree ---

    #[tool(description = "Get the cached folder tree (root items and path-keyed folders)")]
    async fn get_tree(&self) -> Result<CallToolResult, McpError> {
        jsonResult(&api::get_tree(&*self.storage))
    }

    #[tool(description = "Rebuild the folder tree from the filesystem")]
    async fn refresh_tree(&self) -> Result<CallToolResult, McpError> {
        let doc = api::refresh_tree(&*self.storage).await.map_err(toMcpError)?;
        jsonResult(&doc)
    }

    #[tool(description = "Expand or collapse a folder in the tree view")]
    async fn set_expanded(&self, input: Parameters<ExpandInput>) -> Result<CallToolResult, McpError> {
        api::set_expanded(&*self.storage, &input.0.path, input.0.expanded)
            .await
            .map_err(toMcpError)?;
        Ok(CallToolResult::success(vec![Content::text(format!("Folder {} updated", input.0.path))]))
    }

    // --- Folders ---

    #[tool(description = "List the folders and projects directly inside a folder (root when omitted)")]
    async fn list_folder_contents(&self, input: Parameters<FolderPathInput>) -> Result<CallToolResult, McpError> {
        let items = api::list_folder_contents(&*self.storage, input.0.folder_path.as_deref())
            .await
            .map_err(toMcpError)?;
        jsonResult(&items)
    }

    #[tool(description = "Create a new folder; a numeric suffix is added if the name is taken")]
    async fn create_folder(&self, input: Parameters<CreateInput>) -> Result<CallToolResult, McpError> {
        let folder = api::create_folder(&*self.storage, &input.0.name, input.0.parent_path.as_deref())
            .await
            .map_err(toMcpError)?;
        jsonResult(&folder)
    }

    #[tool(description = "Rename a folder in place")]
    async fn rename_folder(&self, input: Parameters<RenameFolderInput>) -> Result<CallToolResult, McpError> {
        let folder = api::rename_folder(&*self.storage, &input.0.path, &input.0.new_name)
            .await
            .map_err(toMcpError)?;
        jsonResult(&folder)
    }

    #[tool(description = "Move a folder (with everything inside it) under another folder or to the root")]
    async fn move_folder(&self, input: Parameters<MoveInput>) -> Result<CallToolResult, McpError> {
        let newPath = api::move_folder(&*self.storage, &input.0.path, input.0.target_path.as_deref())
            .await
            .map_err(toMcpError)?;
        jsonResult(&serde_json::json!({ "path": newPath }))
    }

    #[tool(description = "Delete a folder, moving its contents up to its parent")]
    async fn delete_folder(&self, input: Parameters<DeleteFolderInput>) -> Result<CallToolResult, McpError> {
        let moved = api::delete_folder(&*self.storage, &input.0.path)
            .await
            .map_err(toMcpError)?;
        jsonResult(&serde_json::json!({ "movedItems": moved }))
    }

    // --- Projects ---

    #[tool(description = "Create a new project directory with its project.json marker")]
    async fn create_project(&self, input: Parameters<CreateInput>) -> Result<CallToolResult, McpError> {
        let project = api::create_project(&*self.storage, &input.0.name, input.0.parent_path.as_deref())
            .await
            .map_err(toMcpError)?;
        jsonResult(&project)
    }

    #[tool(description = "Move a project under another folder or to the root")]
    async fn move_project(&self, input: Parameters<MoveInput>) -> Result<CallToolResult, McpError> {
        let newPath = api::move_project(&*self.storage, &input.0.path, input.0.target_path.as_deref())
            .await
            .map_err(toMcpError)?;
        jsonResult(&serde_json::json!({ "path": newPath }))
    }

    #[tool(description = "Search project names (case-insensitive substring) across all folders")]
    async fn search_projects(&self, input: Parameters<SearchInput>) -> Result<CallToolResult, McpError> {
        let matches = api::search_projects(&*self.storage, &input.0.query)
            .await
            .map_err(toMcpError)?;
        jsonResult(&matches)
    }
}
