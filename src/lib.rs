//! Site Mirror - 网站镜像翻译工具库
//!
//! 这个库提供了站点抓取、引用重写、路径映射、分批翻译和镜像编排等核心功能。

pub mod api_constants;
pub mod config;
pub mod error;
pub mod html_processor;
pub mod link_rewriter;
pub mod page_processor;
pub mod path_mapper;
pub mod site_mirror;
pub mod stats;
pub mod translator;
pub mod utils;
pub mod web_crawler;
