//! 镜像拉取进度显示
//!
//! 启用 `indicatif` 特性时，每个镜像层一个进度条；否则只输出 debug 日志。

use crate::container::PullEvent;
#[cfg(feature = "indicatif")]
use std::collections::HashMap;
use tracing::debug;

#[cfg(feature = "indicatif")]
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// 单个镜像的拉取进度
pub struct PullProgress {
    image: String,
    events: usize,
    #[cfg(feature = "indicatif")]
    multi: MultiProgress,
    #[cfg(feature = "indicatif")]
    bars: HashMap<String, ProgressBar>,
    #[cfg(feature = "indicatif")]
    style: Option<ProgressStyle>,
}

impl PullProgress {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            events: 0,
            #[cfg(feature = "indicatif")]
            multi: MultiProgress::new(),
            #[cfg(feature = "indicatif")]
            bars: HashMap::new(),
            #[cfg(feature = "indicatif")]
            style: ProgressStyle::default_bar()
                .template("{prefix:>12} {bar:30.cyan/blue} {bytes}/{total_bytes} {msg}")
                .ok(),
        }
    }

    /// 已处理的消息数
    pub fn event_count(&self) -> usize {
        self.events
    }

    /// 处理一条拉取消息
    pub fn update(&mut self, event: &PullEvent) {
        self.events += 1;
        debug!(
            "{} {} {}",
            self.image,
            event.id.as_deref().unwrap_or("-"),
            event.status.as_deref().unwrap_or_default()
        );

        #[cfg(feature = "indicatif")]
        self.render(event);
    }

    #[cfg(feature = "indicatif")]
    fn render(&mut self, event: &PullEvent) {
        let Some(id) = event.id.as_deref() else {
            return;
        };

        let bar = self.bars.entry(id.to_string()).or_insert_with(|| {
            let bar = self.multi.add(ProgressBar::new(0));
            if let Some(style) = &self.style {
                bar.set_style(style.clone());
            }
            bar.set_prefix(id.to_string());
            bar
        });

        if let Some(total) = event.total.filter(|total| *total > 0) {
            bar.set_length(total as u64);
        }
        if let Some(current) = event.current {
            bar.set_position(current.max(0) as u64);
        }
        if let Some(status) = &event.status {
            bar.set_message(status.clone());
        }
    }

    /// 结束所有进度条
    pub fn finish(self) {
        #[cfg(feature = "indicatif")]
        for bar in self.bars.values() {
            bar.finish();
        }
        debug!("{} 拉取完成，共 {} 条进度消息", self.image, self.events);
    }
}
