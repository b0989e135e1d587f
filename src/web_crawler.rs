//! Web抓取模块
//!
//! 此模块负责：
//! - 维护整个运行期间复用的一个HTTP会话（固定基地址、默认请求头、超时、重定向策略）
//! - 将站内引用解析到基地址上并抓取页面HTML

// 标准库导入
use std::time::Duration;

// 第三方crate导入
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{redirect, Client};
use tracing::debug;
use url::Url;

// 本地模块导入
use crate::api_constants::crawler_config;
use crate::config::MirrorConfig;
use crate::error::Result;
use crate::mirror_error;

/// 页面抓取接口
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 抓取站内引用（或绝对URL）对应页面的HTML
    async fn fetch(&self, reference: &str) -> Result<String>;
}

/// Web爬虫配置结构体
#[derive(Debug, Clone)]
pub struct WebCrawlerConfig {
    /// 基地址，站内引用都相对它解析
    pub base_url: String,
    /// 用户代理字符串
    pub user_agent: String,
    /// 请求超时时间（秒）
    pub timeout: u64,
    /// 最多跟随的重定向次数
    pub max_redirects: usize,
}

impl Default for WebCrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: crawler_config::DEFAULT_START_URL.to_string(),
            user_agent: crawler_config::DEFAULT_USER_AGENT.to_string(),
            timeout: crawler_config::REQUEST_TIMEOUT_SECONDS,
            max_redirects: crawler_config::MAX_REDIRECTS,
        }
    }
}

impl WebCrawlerConfig {
    /// 以指定基地址创建默认配置
    pub fn for_url(url: &str) -> Self {
        Self {
            base_url: url.to_string(),
            ..Default::default()
        }
    }

    /// 从运行配置创建
    pub fn from_mirror_config(config: &MirrorConfig) -> Self {
        Self::for_url(config.start_url())
            .user_agent(config.user_agent())
            .timeout(config.timeout_secs())
    }

    /// 设置用户代理
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// 设置连接超时
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }
}

/// Web爬虫主要结构体
///
/// 持有一个可复用的 `reqwest::Client`，每个请求都带上固定的
/// Accept / Accept-Encoding / Accept-Language / User-Agent 头。
pub struct WebCrawler {
    client: Client,
    base_url: Url,
}

impl WebCrawler {
    /// 创建新的Web爬虫实例
    pub fn new(config: WebCrawlerConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(mirror_error!(config, "base_url", "URL必须以http://或https://开头"));
        }

        let client = Client::builder()
            .default_headers(default_headers(&config.user_agent)?)
            .timeout(Duration::from_secs(config.timeout))
            .redirect(redirect::Policy::limited(config.max_redirects))
            .gzip(true)
            .deflate(true)
            .build()?;

        debug!("爬虫配置: {:?}", config);
        Ok(Self { client, base_url })
    }

    /// 把站内引用解析为完整URL
    pub fn resolve_url(&self, reference: &str) -> Result<Url> {
        Ok(self.base_url.join(reference.trim())?)
    }
}

#[async_trait]
impl PageFetcher for WebCrawler {
    async fn fetch(&self, reference: &str) -> Result<String> {
        let url = self.resolve_url(reference)?;
        debug!("🌐 GET {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(mirror_error!(network, format!("{} 返回 {}", url, status), status.as_u16()));
        }

        let html = response.text().await?;
        debug!("✅ {} 抓取完成，大小: {} 字节", url, html.len());
        Ok(html)
    }
}

/// 每个请求都携带的默认请求头
fn default_headers(user_agent: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(crawler_config::ACCEPT));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(crawler_config::ACCEPT_ENCODING));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(crawler_config::ACCEPT_LANGUAGE));
    headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent)
            .map_err(|e| mirror_error!(config, "user_agent", e))?,
    );
    Ok(headers)
}
