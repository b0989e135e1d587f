/// 镜像与翻译相关常量配置
///
/// 该文件集中定义抓取、路径映射、批量翻译所用的默认值，方便统一管理和维护

/// 站点抓取配置
pub mod crawler_config {
    /// 默认起始URL
    pub const DEFAULT_START_URL: &str = "https://www.classcentral.com";

    /// 默认镜像根目录
    pub const DEFAULT_MIRROR_DIR: &str = "pages";

    /// 请求超时时间（秒）
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// 最多跟随的重定向次数
    pub const MAX_REDIRECTS: usize = 10;

    /// 默认User-Agent
    pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_4) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/83.0.4103.97 Safari/537.36";

    /// 每个请求都携带的Accept头
    pub const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9";

    /// 每个请求都携带的Accept-Encoding头
    pub const ACCEPT_ENCODING: &str = "gzip, deflate";

    /// 每个请求都携带的Accept-Language头
    pub const ACCEPT_LANGUAGE: &str = "en-GB,en-US;q=0.9,en;q=0.8";
}

/// 链接过滤配置
pub mod link_config {
    /// 邮箱混淆保护页面的特征（Cloudflare email-protection）
    pub const CONTACT_PROTECTION_PATTERN: &str = r"email-protection";

    /// 首页导航下拉菜单的标记属性，带此标记的锚点不参与抓取
    pub const NAV_MARKER_ATTR: &str = "data-track-click";

    /// 导航下拉菜单标记属性的取值
    pub const NAV_MARKER_VALUE: &str = "nav_click";

    /// 懒加载图片的数据属性
    pub const LAZY_SRC_ATTR: &str = "data-src";
}

/// 翻译服务配置
pub mod service_config {
    /// 默认翻译API地址（DeepLX兼容接口）
    pub const DEFAULT_API_URL: &str = "http://localhost:1188/translate";

    /// 默认源语言
    pub const DEFAULT_SOURCE_LANG: &str = "en";

    /// 默认目标语言
    pub const DEFAULT_TARGET_LANG: &str = "hi";

    /// 每个批次最多包含的文本条数
    pub const DEFAULT_BATCH_SIZE: usize = 4;

    /// 批次拼接后的长度上限（字符数），达到即拒绝整批翻译
    pub const DEFAULT_MAX_BATCH_CHARS: usize = 235;

    /// 批次内文本分隔符
    pub const DEFAULT_SEPARATOR: &str = "|-|";
}

/// 验证URL是否为http/https地址
pub fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
