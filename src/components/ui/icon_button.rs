use leptos::prelude::*;
use leptos_ui::variants;

variants! {
    IconButton {
        base: "inline-flex shrink-0 items-center justify-center rounded-md text-sm font-medium transition-all outline-none select-none hover:cursor-pointer focus-visible:ring-ring/50 focus-visible:ring-[3px] disabled:pointer-events-none disabled:opacity-50",
        variants: {
            variant: {
                Default: "text-muted-foreground hover:bg-destructive/10 hover:text-destructive",
                Ghost: "hover:bg-accent hover:text-accent-foreground",
            },
            size: {
                Default: "size-6",
                Sm: "size-5 text-xs",
            }
        },
        component: {
            element: button
        }
    }
}
