//! 站点镜像编排模块
//!
//! 两个阶段，不再递归：
//! 1. 首页阶段：抓取起始页 -> 页面处理 -> 写入 `<root>/index.html`
//! 2. 扩展阶段：对首页（处理前）发现的每个锚点依次抓取、处理、写入
//!
//! 扩展阶段单个页面失败只记录日志并继续，不重试；一级页面里的锚点不再跟进。

// 标准库导入
use std::path::PathBuf;

// 第三方crate导入
use regex::Regex;
use tracing::{error, info, warn};

// 本地模块导入
use crate::api_constants::link_config;
use crate::config::MirrorConfig;
use crate::error::{MirrorError, Result};
use crate::html_processor::parse_html;
use crate::link_rewriter::LinkRewriter;
use crate::mirror_error;
use crate::page_processor::PageProcessor;
use crate::path_mapper::PathMapper;
use crate::stats::MirrorStats;
use crate::translator::{BatchTranslator, HttpTranslationBackend, TranslationBackend};
use crate::utils::{mirror_inventory, normalize_anchor};
use crate::web_crawler::{PageFetcher, WebCrawler, WebCrawlerConfig};

/// 锚点被跳过的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 指向首页本身
    StartPage,
    /// 邮箱混淆保护页面
    ContactProtection,
    /// 外链、纯片段等非站内路径
    NotSameSite,
    /// 无法安全映射到镜像目录
    Unsupported,
    /// 目标文件已经存在
    AlreadyMirrored(PathBuf),
}

/// 单个锚点的处理结果
#[derive(Debug)]
pub enum CrawlOutcome {
    Mirrored(PathBuf),
    Skipped(SkipReason),
    Failed(MirrorError),
}

/// 站点镜像编排器
pub struct SiteMirror<F, B> {
    fetcher: F,
    processor: PageProcessor<B>,
    mapper: PathMapper,
    start_url: String,
    origin: String,
    contact_pattern: Regex,
}

impl SiteMirror<WebCrawler, HttpTranslationBackend> {
    /// 使用HTTP抓取器和HTTP翻译后端创建
    pub fn from_config(config: &MirrorConfig) -> Result<Self> {
        let fetcher = WebCrawler::new(WebCrawlerConfig::from_mirror_config(config))?;
        let backend = HttpTranslationBackend::from_config(config)?;
        Self::new(config, fetcher, backend)
    }
}

impl<F: PageFetcher, B: TranslationBackend> SiteMirror<F, B> {
    /// 以自定义抓取器和翻译后端创建
    pub fn new(config: &MirrorConfig, fetcher: F, backend: B) -> Result<Self> {
        config.validate()?;

        let processor = PageProcessor::new(
            LinkRewriter::from_config(config)?,
            BatchTranslator::from_config(backend, config),
        );
        let contact_pattern = Regex::new(link_config::CONTACT_PROTECTION_PATTERN)
            .map_err(|e| mirror_error!(config, "contact_pattern", e))?;

        Ok(Self {
            fetcher,
            processor,
            mapper: PathMapper::new(config.output_dir()),
            start_url: config.start_url().to_string(),
            origin: config.origin()?,
            contact_pattern,
        })
    }

    /// 执行完整的两阶段镜像
    ///
    /// 首页阶段失败直接返回错误；扩展阶段的失败只计入统计。
    pub async fn run(&self) -> Result<MirrorStats> {
        let mut stats = MirrorStats::default();

        let anchors = self.mirror_home(&mut stats).await?;
        stats.anchors_discovered = anchors.len();

        self.expand(&anchors, &mut stats).await;

        stats.pages_on_disk = mirror_inventory(self.mapper.root());
        Ok(stats)
    }

    /// 首页阶段，返回处理前发现的站内锚点
    async fn mirror_home(&self, stats: &mut MirrorStats) -> Result<Vec<String>> {
        info!("🏠 {} - 抓取首页...", self.start_url);
        let raw_html = self.fetcher.fetch(&self.start_url).await?;

        let target = self.mapper.resolve_root().await?;
        if target.already_exists {
            warn!("⏭️ {} 首页已存在，跳过处理", target.path.display());
            stats.pages_skipped += 1;
            let dom = parse_html(&raw_html)?;
            return Ok(self.processor.rewriter().discover_anchors(&dom));
        }

        let page = self.processor.process(&raw_html).await?;
        self.mapper.persist(&target, &page.to_html()?).await?;
        stats.pages_mirrored += 1;
        stats.translation.merge(&page.stats);

        info!("✅ 首页完成: {}", target.path.display());
        Ok(page.anchors)
    }

    /// 扩展阶段：按发现顺序逐个处理锚点
    async fn expand(&self, anchors: &[String], stats: &mut MirrorStats) {
        let total = anchors.len();

        for (i, href) in anchors.iter().enumerate() {
            let position = i + 1;

            match self.mirror_anchor(href, position, total, stats).await {
                CrawlOutcome::Mirrored(path) => {
                    stats.pages_mirrored += 1;
                    info!("✅ {} / {} - {} 完成", position, total, path.display());
                }
                CrawlOutcome::Skipped(reason) => {
                    stats.pages_skipped += 1;
                    match reason {
                        SkipReason::AlreadyMirrored(path) => {
                            warn!("⏭️ {} / {} - {} 已镜像，跳过", position, total, path.display())
                        }
                        other => warn!("⏭️ {} / {} - {} 跳过: {:?}", position, total, href, other),
                    }
                }
                CrawlOutcome::Failed(e) => {
                    stats.pages_failed += 1;
                    error!("❌ {} / {} - {} 失败: {}", position, total, href, e);
                }
            }
        }
    }

    /// 处理单个锚点
    async fn mirror_anchor(
        &self,
        href: &str,
        position: usize,
        total: usize,
        stats: &mut MirrorStats,
    ) -> CrawlOutcome {
        if self.contact_pattern.is_match(href) {
            return CrawlOutcome::Skipped(SkipReason::ContactProtection);
        }

        let reference = match normalize_anchor(href, &self.origin) {
            Some(reference) if reference == "/" => {
                return CrawlOutcome::Skipped(SkipReason::StartPage)
            }
            Some(reference) => reference,
            None => return CrawlOutcome::Skipped(SkipReason::NotSameSite),
        };

        let target = match self.mapper.resolve(&reference).await {
            Ok(target) => target,
            Err(MirrorError::InputValidation { .. }) => {
                return CrawlOutcome::Skipped(SkipReason::Unsupported)
            }
            Err(e) => return CrawlOutcome::Failed(e),
        };
        if target.already_exists {
            return CrawlOutcome::Skipped(SkipReason::AlreadyMirrored(target.path));
        }

        info!("🕷️ {} / {} - {} 抓取中...", position, total, target.path.display());
        let result = async {
            let raw_html = self.fetcher.fetch(&target.reference).await?;
            let page = self.processor.process(&raw_html).await?;
            self.mapper.persist(&target, &page.to_html()?).await?;
            Ok::<_, MirrorError>(page.stats)
        }
        .await;

        match result {
            Ok(page_stats) => {
                stats.translation.merge(&page_stats);
                CrawlOutcome::Mirrored(target.path)
            }
            Err(e) => CrawlOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::tests::ScriptedBackend;
    use std::path::Path;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    async fn serve(server: &MockServer, route: &str, html: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(html.to_string()))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn never_requested(server: &MockServer, route: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(server)
            .await;
    }

    fn mirror_for(server: &MockServer, root: &Path) -> SiteMirror<WebCrawler, ScriptedBackend> {
        let config = MirrorConfig::new()
            .with_start_url(&server.uri())
            .with_output_dir(root);
        let fetcher = WebCrawler::new(WebCrawlerConfig::from_mirror_config(&config)).unwrap();
        SiteMirror::new(&config, fetcher, ScriptedBackend::bracketing()).unwrap()
    }

    #[tokio::test]
    async fn test_home_and_single_segment_page() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("pages");

        serve(&server, "/", r#"<html><body><a href="/topic">Topic</a></body></html>"#).await;
        serve(&server, "/topic", "<html><body><h1>Topic page</h1></body></html>").await;

        let stats = mirror_for(&server, &root).run().await?;

        assert!(root.join("index.html").is_file());
        assert!(root.join("topic/index.html").is_file());
        assert_eq!(stats.pages_mirrored, 2);
        assert_eq!(stats.pages_on_disk, 2);

        let home = std::fs::read_to_string(root.join("index.html"))?;
        assert!(home.contains(r#"<a href="/topic">[Topic]</a>"#));
        let topic = std::fs::read_to_string(root.join("topic/index.html"))?;
        assert!(topic.contains("<h1>[Topic page]</h1>"));
        Ok(())
    }

    #[tokio::test]
    async fn test_deep_anchor_creates_intermediate_dirs() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("pages");

        serve(&server, "/", r#"<body><a href="/a/b/c/d/">Deep</a></body>"#).await;
        serve(&server, "/a/b/c/d", "<p>deep</p>").await;

        mirror_for(&server, &root).run().await?;

        assert!(root.join("a/b").is_dir());
        assert!(root.join("a/b/c/d.html").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn test_start_page_and_contact_protection_skipped() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("pages");

        let origin = server.uri();
        let home = format!(
            r#"<body><a href="/">Home</a><a href="{origin}/">Home again</a><a href="/cdn-cgi/l/email-protection#1a2b">Mail</a></body>"#
        );
        serve(&server, "/", &home).await;
        never_requested(&server, "/cdn-cgi/l/email-protection").await;

        let stats = mirror_for(&server, &root).run().await?;

        assert_eq!(stats.pages_mirrored, 1);
        assert_eq!(stats.pages_skipped, 3);
        assert_eq!(stats.pages_on_disk, 1);
        assert!(!root.join("cdn-cgi").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_already_mirrored_page_not_fetched() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("pages");
        std::fs::create_dir_all(root.join("topic"))?;
        std::fs::write(root.join("topic/index.html"), "existing")?;

        serve(&server, "/", r#"<body><a href="/topic">Topic</a><a href="/topic/">Again</a></body>"#).await;
        never_requested(&server, "/topic").await;

        let stats = mirror_for(&server, &root).run().await?;

        assert_eq!(stats.pages_skipped, 2);
        assert_eq!(std::fs::read_to_string(root.join("topic/index.html"))?, "existing");
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_anchor_mirrored_once() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("pages");

        serve(&server, "/", r#"<body><a href="/topic">A</a><a href="/topic">B</a></body>"#).await;
        serve(&server, "/topic", "<p>topic</p>").await;

        let stats = mirror_for(&server, &root).run().await?;

        assert_eq!(stats.pages_mirrored, 2);
        assert_eq!(stats.pages_skipped, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_page_failure_does_not_stop_crawl() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("pages");

        serve(&server, "/", r#"<body><a href="/broken">X</a><a href="/ok">Y</a></body>"#).await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        serve(&server, "/ok", "<p>fine</p>").await;

        let stats = mirror_for(&server, &root).run().await?;

        assert_eq!(stats.pages_failed, 1);
        assert_eq!(stats.pages_mirrored, 2);
        assert!(!root.join("broken/index.html").exists());
        assert!(root.join("ok/index.html").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn test_unmappable_target_does_not_stop_crawl() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("pages");
        std::fs::create_dir_all(&root)?;
        // 普通文件占住了目录位置
        std::fs::write(root.join("topic"), "not a directory")?;

        serve(&server, "/", r#"<body><a href="/topic">T</a><a href="/ok">OK</a></body>"#).await;
        never_requested(&server, "/topic").await;
        serve(&server, "/ok", "<p>fine</p>").await;

        let stats = mirror_for(&server, &root).run().await?;

        assert_eq!(stats.pages_failed, 1);
        assert_eq!(stats.pages_mirrored, 2);
        assert!(root.join("ok/index.html").is_file());
        assert_eq!(std::fs::read_to_string(root.join("topic"))?, "not a directory");
        Ok(())
    }

    /// 内存抓取器，抓取前执行钩子
    struct HookedFetcher {
        pages: Vec<(&'static str, &'static str)>,
        before_fetch: Box<dyn Fn(&str) + Send + Sync>,
    }

    #[async_trait::async_trait]
    impl PageFetcher for HookedFetcher {
        async fn fetch(&self, reference: &str) -> Result<String> {
            (self.before_fetch)(reference);
            self.pages
                .iter()
                .find(|(route, _)| *route == reference)
                .map(|(_, html)| html.to_string())
                .ok_or_else(|| mirror_error!(network, format!("{} 不存在", reference), 404))
        }
    }

    #[tokio::test]
    async fn test_write_failure_does_not_stop_crawl() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("pages");

        // 目录解析完成后、写入之前，把目录换成同名文件
        let blocked_dir = root.join("blocked");
        let fetcher = HookedFetcher {
            pages: vec![
                ("https://example.test", r#"<body><a href="/blocked">B</a><a href="/ok">OK</a></body>"#),
                ("/blocked", "<p>blocked</p>"),
                ("/ok", "<p>fine</p>"),
            ],
            before_fetch: Box::new(move |reference| {
                if reference == "/blocked" {
                    std::fs::remove_dir(&blocked_dir).unwrap();
                    std::fs::write(&blocked_dir, "file").unwrap();
                }
            }),
        };
        let config = MirrorConfig::new()
            .with_start_url("https://example.test")
            .with_output_dir(&root);
        let mirror = SiteMirror::new(&config, fetcher, ScriptedBackend::bracketing())?;

        let stats = mirror.run().await?;

        assert_eq!(stats.pages_failed, 1);
        assert_eq!(stats.pages_mirrored, 2);
        assert!(root.join("blocked").is_file());
        assert!(root.join("ok/index.html").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn test_only_one_level_is_crawled() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("pages");

        serve(&server, "/", r#"<body><a href="/topic">Topic</a></body>"#).await;
        serve(&server, "/topic", r#"<body><a href="/deeper">Deeper</a></body>"#).await;
        never_requested(&server, "/deeper").await;

        mirror_for(&server, &root).run().await?;

        assert!(!root.join("deeper").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_external_and_nav_anchors_ignored() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("pages");

        serve(
            &server,
            "/",
            r#"<body>
                <a href="https://elsewhere.example.org/x">Out</a>
                <a href="mailto:team@example.test">Mail</a>
                <a data-track-click="nav_click" href="/menu">Menu</a>
                <a rel="nofollow" href="/sponsored">Ad</a>
            </body>"#,
        )
        .await;
        never_requested(&server, "/menu").await;
        never_requested(&server, "/sponsored").await;

        let stats = mirror_for(&server, &root).run().await?;

        assert_eq!(stats.anchors_discovered, 2);
        assert_eq!(stats.pages_skipped, 2);
        assert_eq!(stats.pages_on_disk, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_home_failure_aborts_run() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("pages");

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = mirror_for(&server, &root).run().await;
        assert!(matches!(result, Err(MirrorError::Network { .. })));
        assert!(!root.join("index.html").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_home_is_not_overwritten() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("pages");
        std::fs::create_dir_all(&root)?;
        std::fs::write(root.join("index.html"), "old home")?;

        serve(&server, "/", r#"<body><a href="/topic">Topic</a></body>"#).await;
        serve(&server, "/topic", "<p>topic</p>").await;

        let stats = mirror_for(&server, &root).run().await?;

        assert_eq!(std::fs::read_to_string(root.join("index.html"))?, "old home");
        assert!(root.join("topic/index.html").is_file());
        assert_eq!(stats.pages_mirrored, 1);
        Ok(())
    }
}
