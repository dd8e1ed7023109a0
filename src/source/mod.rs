//! @acp:module "Source"
//! @acp:summary "Go source loading: declaration IR, tree-sitter loader, cache, go.mod"
//! @acp:domain analysis
//! @acp:layer parser

pub mod cache;
pub mod go;
pub mod manifest;
pub mod model;

pub use cache::SourceCache;
pub use go::GoParser;
pub use manifest::{find_module, ModuleInfo};
pub use model::{
    ChanDir, Comment, Declaration, FieldDecl, FuncDecl, Import, MethodSpec, Param, Receiver,
    Signature, SourceFile, TypeBody, TypeDecl, TypeExpr,
};
