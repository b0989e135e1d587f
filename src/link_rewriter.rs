//! 链接重写模块
//!
//! 负责让镜像页面内的引用指向镜像或原站资源：
//! 1. 懒加载图片的 `data-src` 提升为 `src`
//! 2. 声明了 `rel` 的 `<link>`：站内相对引用改写到资源主机，canonical 与已含源的引用保持不变
//! 3. 除第一个外的 `<script src>`：同上
//! 4. 站内导航锚点：去掉源，只保留相对主机的路径
//!
//! 每一步都对当前（可能已被前一步修改的）DOM重新查询。

// 第三方crate导入
use markup5ever_rcdom::{Handle, RcDom};
use tracing::debug;

// 本地模块导入
use crate::api_constants::link_config;
use crate::config::MirrorConfig;
use crate::error::Result;
use crate::html_processor::{find_elements, get_node_attr, has_node_attr, set_node_attr};
use crate::utils::{classify_reference, strip_origin, ReferenceKind};

/// 引用重写器
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    /// 起始站点的源，如 `https://example.test`
    origin: String,
    /// 样式表/脚本改写后指向的主机
    asset_host: String,
}

impl LinkRewriter {
    /// 创建重写器
    pub fn new(origin: &str, asset_host: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            asset_host: asset_host.trim_end_matches('/').to_string(),
        }
    }

    /// 从运行配置创建重写器
    pub fn from_config(config: &MirrorConfig) -> Result<Self> {
        Ok(Self::new(&config.origin()?, &config.asset_host()?))
    }

    /// 依次执行四条重写规则，返回处理后的DOM
    pub fn rewrite(&self, dom: RcDom) -> RcDom {
        let promoted = self.promote_lazy_images(&dom.document);
        let links = self.rewrite_link_elements(&dom.document);
        let scripts = self.rewrite_scripts(&dom.document);
        let anchors = self.rewrite_anchors(&dom.document);

        debug!(
            "🔗 引用重写: 懒加载图片 {} 个, link {} 个, script {} 个, 锚点 {} 个",
            promoted, links, scripts, anchors
        );
        dom
    }

    /// 按文档顺序列出站内导航锚点的路径（去掉源），不修改DOM
    pub fn discover_anchors(&self, dom: &RcDom) -> Vec<String> {
        navigable_anchors(&dom.document)
            .iter()
            .filter_map(|anchor| get_node_attr(anchor, "href"))
            .map(|href| strip_origin(&href, &self.origin))
            .collect()
    }

    /// 规则1：懒加载图片
    fn promote_lazy_images(&self, root: &Handle) -> usize {
        let mut count = 0;
        for img in find_elements(root, "img") {
            if let Some(lazy_src) = get_node_attr(&img, link_config::LAZY_SRC_ATTR) {
                set_node_attr(&img, "src", &lazy_src);
                count += 1;
            }
        }
        count
    }

    /// 规则2：`<link rel=...>`
    fn rewrite_link_elements(&self, root: &Handle) -> usize {
        let mut count = 0;
        for link in find_elements(root, "link") {
            let Some(rel) = get_node_attr(&link, "rel") else {
                continue;
            };
            if rel
                .split_whitespace()
                .any(|value| value.eq_ignore_ascii_case("canonical"))
            {
                continue;
            }
            if self.rewrite_attr(&link, "href") {
                count += 1;
            }
        }
        count
    }

    /// 规则3：`<script src>`，第一个视为必需的引导脚本保持原样
    fn rewrite_scripts(&self, root: &Handle) -> usize {
        find_elements(root, "script")
            .into_iter()
            .filter(|script| has_node_attr(script, "src"))
            .skip(1)
            .filter(|script| self.rewrite_attr(script, "src"))
            .count()
    }

    /// 规则4：站内导航锚点
    fn rewrite_anchors(&self, root: &Handle) -> usize {
        let mut count = 0;
        for anchor in navigable_anchors(root) {
            if let Some(href) = get_node_attr(&anchor, "href") {
                let stripped = strip_origin(&href, &self.origin);
                if stripped != href {
                    set_node_attr(&anchor, "href", &stripped);
                    count += 1;
                }
            }
        }
        count
    }

    /// 把站内相对引用改写到资源主机，返回是否发生改写
    fn rewrite_attr(&self, node: &Handle, attr_name: &str) -> bool {
        let Some(reference) = get_node_attr(node, attr_name) else {
            return false;
        };
        match self.asset_reference(&reference) {
            Some(rewritten) => {
                set_node_attr(node, attr_name, &rewritten);
                true
            }
            None => false,
        }
    }

    /// 计算资源引用改写结果
    ///
    /// 只改写以 `/` 开头的站内路径；外链、已含源的引用、空引用和相对当前文档的
    /// 引用（`css/a.css`、`../x.js`）返回 `None`，保持原样。
    pub fn asset_reference(&self, reference: &str) -> Option<String> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return None;
        }

        match classify_reference(trimmed, &self.origin) {
            ReferenceKind::SameSiteAbsolute | ReferenceKind::External => None,
            ReferenceKind::SameSiteRelative => {
                let path = strip_origin(trimmed, &self.origin);
                path.starts_with('/').then(|| format!("{}{}", self.asset_host, path))
            }
        }
    }
}

/// 带 `href`、不带 `rel`、且不属于导航下拉菜单的 `<a>` 元素
fn navigable_anchors(root: &Handle) -> Vec<Handle> {
    find_elements(root, "a")
        .into_iter()
        .filter(|anchor| has_node_attr(anchor, "href") && !has_node_attr(anchor, "rel"))
        .filter(|anchor| {
            get_node_attr(anchor, link_config::NAV_MARKER_ATTR).as_deref()
                != Some(link_config::NAV_MARKER_VALUE)
        })
        .collect()
}
