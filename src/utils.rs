use std::path::Path;

use url::Url;
use walkdir::WalkDir;

/// 页面内引用的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// 站内相对引用，如 `/css/app.css`
    SameSiteRelative,
    /// 已包含起始站点源的绝对引用
    SameSiteAbsolute,
    /// 指向其他主机或非HTTP协议的引用（含 `//cdn` 协议相对地址、`mailto:` 等）
    External,
}

/// 初始化日志系统
pub fn init_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// 判断引用属于哪一类
pub fn classify_reference(reference: &str, origin: &str) -> ReferenceKind {
    let reference = reference.trim();

    if !origin.is_empty() && reference.contains(origin) {
        return ReferenceKind::SameSiteAbsolute;
    }

    if reference.starts_with("//") || Url::parse(reference).is_ok() {
        return ReferenceKind::External;
    }

    ReferenceKind::SameSiteRelative
}

/// 去掉首尾空白并移除引用中的起始站点源，得到相对主机的路径
pub fn strip_origin(reference: &str, origin: &str) -> String {
    let trimmed = reference.trim();
    if origin.is_empty() {
        return trimmed.to_string();
    }
    trimmed.replace(origin, "")
}

/// 把站内锚点整理成可映射的站内路径
///
/// 去掉源、`#片段`、`?查询` 和结尾的 `/`。站点根目录返回 `"/"`，
/// 非站内路径（外链、`mailto:`、纯片段等）返回 `None`。
pub fn normalize_anchor(href: &str, origin: &str) -> Option<String> {
    let stripped = strip_origin(href, origin);

    let path = stripped
        .split(['#', '?'])
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        // 剥离源后为空说明指向首页本身
        return if stripped.is_empty() { Some("/".to_string()) } else { None };
    }

    if !path.starts_with('/') || path.starts_with("//") {
        return None;
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        Some("/".to_string())
    } else {
        Some(trimmed.to_string())
    }
}

/// 统计镜像目录中已有的HTML页面数量
pub fn mirror_inventory(root: &Path) -> usize {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| ext == "html")
                .unwrap_or(false)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://example.test";

    #[test]
    fn test_classify_reference() {
        assert_eq!(classify_reference("/css/app.css", ORIGIN), ReferenceKind::SameSiteRelative);
        assert_eq!(
            classify_reference("https://example.test/css/app.css", ORIGIN),
            ReferenceKind::SameSiteAbsolute
        );
        assert_eq!(
            classify_reference("https://fonts.example.org/x.css", ORIGIN),
            ReferenceKind::External
        );
        assert_eq!(classify_reference("//cdn.example.org/x.js", ORIGIN), ReferenceKind::External);
        assert_eq!(classify_reference("mailto:a@b.c", ORIGIN), ReferenceKind::External);
    }

    #[test]
    fn test_strip_origin() {
        assert_eq!(strip_origin("  https://example.test/topic  ", ORIGIN), "/topic");
        assert_eq!(strip_origin("/topic", ORIGIN), "/topic");
        assert_eq!(strip_origin("https://other.test/x", ORIGIN), "https://other.test/x");
    }

    #[test]
    fn test_normalize_anchor() {
        assert_eq!(normalize_anchor("/topic/", ORIGIN).as_deref(), Some("/topic"));
        assert_eq!(normalize_anchor("https://example.test/a/b/", ORIGIN).as_deref(), Some("/a/b"));
        assert_eq!(normalize_anchor("/topic?page=2#top", ORIGIN).as_deref(), Some("/topic"));
        assert_eq!(normalize_anchor("/", ORIGIN).as_deref(), Some("/"));
        assert_eq!(normalize_anchor("https://example.test", ORIGIN).as_deref(), Some("/"));
        assert_eq!(normalize_anchor("#main", ORIGIN), None);
        assert_eq!(normalize_anchor("https://other.test/x", ORIGIN), None);
        assert_eq!(normalize_anchor("//cdn.example.org/x", ORIGIN), None);
        assert_eq!(normalize_anchor("mailto:a@b.c", ORIGIN), None);
    }

    #[test]
    fn test_mirror_inventory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("topic")).unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>x</p>").unwrap();
        std::fs::write(dir.path().join("topic/index.html"), "<p>y</p>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "z").unwrap();

        assert_eq!(mirror_inventory(dir.path()), 2);
    }
}
