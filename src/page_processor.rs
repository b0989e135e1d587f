//! 页面处理模块
//!
//! 单个页面的完整流水线：解析 -> 发现站内锚点（只读） -> 引用重写 -> 分批翻译。
//! 首页与一级页面都经过同一条流水线后再落盘。

use markup5ever_rcdom::RcDom;
use tracing::debug;

use crate::error::Result;
use crate::html_processor::{apply_translations, extract_text_spans, parse_html, serialize_dom_to_html};
use crate::link_rewriter::LinkRewriter;
use crate::translator::{BatchStats, BatchTranslator, TranslationBackend};

/// 处理完成的页面
pub struct ProcessedPage {
    /// 重写并翻译后的DOM
    pub dom: RcDom,
    /// 处理前发现的站内锚点（已去掉源，文档顺序）
    pub anchors: Vec<String>,
    /// 本页翻译统计
    pub stats: BatchStats,
}

impl ProcessedPage {
    /// 序列化为HTML
    pub fn to_html(&self) -> Result<String> {
        serialize_dom_to_html(&self.dom)
    }
}

/// 页面处理器
pub struct PageProcessor<B> {
    rewriter: LinkRewriter,
    translator: BatchTranslator<B>,
}

impl<B: TranslationBackend> PageProcessor<B> {
    pub fn new(rewriter: LinkRewriter, translator: BatchTranslator<B>) -> Self {
        Self { rewriter, translator }
    }

    pub fn rewriter(&self) -> &LinkRewriter {
        &self.rewriter
    }

    pub fn translator(&self) -> &BatchTranslator<B> {
        &self.translator
    }

    /// 处理一个抓取到的页面
    pub async fn process(&self, raw_html: &str) -> Result<ProcessedPage> {
        let dom = parse_html(raw_html)?;

        // 锚点必须在任何修改之前发现
        let anchors = self.rewriter.discover_anchors(&dom);
        let dom = self.rewriter.rewrite(dom);
        let (dom, stats) = self.translate(dom).await?;

        Ok(ProcessedPage { dom, anchors, stats })
    }

    /// 提取全部叶子文本、分批翻译并按原序回填
    pub async fn translate(&self, dom: RcDom) -> Result<(RcDom, BatchStats)> {
        let spans = extract_text_spans(&dom);
        if spans.is_empty() {
            return Ok((dom, BatchStats::default()));
        }

        let texts: Vec<String> = spans.iter().map(|span| span.text.clone()).collect();
        let output = self.translator.translate_texts(&texts).await;

        let applied = apply_translations(&spans, &output.translations)?;
        debug!("📝 回填译文 {} / {} 处", applied, spans.len());

        Ok((dom, output.stats))
    }
}
