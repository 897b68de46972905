use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {PageContainer, main, "mx-auto flex w-full max-w-[760px] flex-col gap-4 px-4 py-8"}
    clx! {BlockCard, section, "bg-card text-card-foreground flex flex-col gap-2 rounded-xl border px-4 py-3 shadow-sm data-[focused=true]:border-ring"}
    clx! {BlockMeta, header, "flex items-center gap-3 text-muted-foreground"}
    clx! {BlockTimestamp, span, "shrink-0 text-xs tabular-nums"}
    clx! {BlockBody, div, "flex flex-col"}
    clx! {PageFooter, footer, "py-4 text-center text-xs text-muted-foreground tabular-nums"}
}

pub use components::*;
