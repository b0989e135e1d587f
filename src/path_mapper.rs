//! 路径映射模块
//!
//! 将站内引用映射为镜像目录下的本地文件路径：
//! - 单级引用（如 `/topic`）视为目录首页，落到 `topic/index.html`
//! - 两级深度引用（三个分隔符）先补建中间目录
//! - 目标文件已存在时报告 `already_exists`，调用方跳过，从不覆盖

// 标准库导入
use std::path::{Path, PathBuf};

// 第三方crate导入
use tokio::io::AsyncWriteExt;
use tracing::debug;

// 本地模块导入
use crate::error::Result;
use crate::mirror_error;

/// 首页及目录首页的文件名（不含扩展名）
const INDEX_NAME: &str = "index";

/// 镜像文件扩展名
const PAGE_EXTENSION: &str = "html";

/// 一个镜像目标：站内引用与本地文件的一一对应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorTarget {
    /// 规范化后的站内引用
    pub reference: String,
    /// 本地文件路径
    pub path: PathBuf,
    /// 目标文件是否已经存在
    pub already_exists: bool,
}

/// 路径映射器
#[derive(Debug, Clone)]
pub struct PathMapper {
    root: PathBuf,
}

impl PathMapper {
    /// 以镜像根目录创建映射器
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// 镜像根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn ensure_root(&self) -> Result<()> {
        ensure_dir(&self.root).await
    }

    /// 起始页面对应的目标：`<root>/index.html`
    pub async fn resolve_root(&self) -> Result<MirrorTarget> {
        self.ensure_root().await?;
        let path = self.root.join(format!("{}.{}", INDEX_NAME, PAGE_EXTENSION));
        let already_exists = path_exists(&path).await?;

        Ok(MirrorTarget {
            reference: "/".to_string(),
            path,
            already_exists,
        })
    }

    /// 将站内引用解析为本地路径
    ///
    /// 引用必须以 `/` 开头；结尾的 `/` 会被去掉。目标已存在时不创建任何目录。
    pub async fn resolve(&self, reference: &str) -> Result<MirrorTarget> {
        let reference = reference.trim().trim_end_matches('/');
        if reference.is_empty() {
            return self.resolve_root().await;
        }
        validate_reference(reference)?;

        let relative = match reference.matches('/').count() {
            1 => format!("{}/{}", reference, INDEX_NAME),
            3 => {
                let segments: Vec<&str> = reference.split('/').collect();
                let intermediate = segments[..segments.len() - 2].join("/");
                let dir = self.root.join(intermediate.trim_start_matches('/'));
                if !path_exists(&dir).await? {
                    debug!("📁 新建中间目录: {}", dir.display());
                    ensure_dir(&dir).await?;
                }
                reference.to_string()
            }
            _ => reference.to_string(),
        };

        let path = self
            .root
            .join(format!("{}.{}", relative.trim_start_matches('/'), PAGE_EXTENSION));

        if path_exists(&path).await? {
            return Ok(MirrorTarget {
                reference: reference.to_string(),
                path,
                already_exists: true,
            });
        }

        if let Some(parent) = path.parent() {
            if !path_exists(parent).await? {
                debug!("📁 新建目录: {}", parent.display());
                ensure_dir(parent).await?;
            }
        }

        Ok(MirrorTarget {
            reference: reference.to_string(),
            path,
            already_exists: false,
        })
    }

    /// 写入处理完成的页面，目标文件已存在时返回错误而不覆盖
    pub async fn persist(&self, target: &MirrorTarget, html: &str) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target.path)
            .await
            .map_err(|e| mirror_error!(file_op, target.path.display(), "创建", e))?;

        file.write_all(html.as_bytes())
            .await
            .map_err(|e| mirror_error!(file_op, target.path.display(), "写入", e))?;
        file.flush()
            .await
            .map_err(|e| mirror_error!(file_op, target.path.display(), "写入", e))?;

        debug!("💾 已写入 {} ({} 字节)", target.path.display(), html.len());
        Ok(())
    }
}

/// 拒绝无法安全映射到镜像目录内的引用
fn validate_reference(reference: &str) -> Result<()> {
    if !reference.starts_with('/') || reference.starts_with("//") {
        return Err(mirror_error!(input_validation, reference, "不是站内相对路径"));
    }
    if reference
        .split('/')
        .skip(1)
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(mirror_error!(input_validation, reference, "路径包含空段或相对段"));
    }
    if reference.contains('\\') {
        return Err(mirror_error!(input_validation, reference, "路径包含反斜杠"));
    }
    Ok(())
}

async fn path_exists(path: &Path) -> Result<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| mirror_error!(file_op, path.display(), "检查", e))
}

async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| mirror_error!(file_op, path.display(), "创建目录", e))
}
