use async_trait::async_trait;
use maplet_bubbles::layers::overlay::OverlayId;
use maplet_bubbles::prelude::*;
use maplet_bubbles::traits::{IdentityProvider, LogWarningSink, TooltipProvider};

/// Selection model that keeps exactly what was clicked last
#[derive(Default)]
struct LastClicked(Mutex<Vec<SelectionId>>);

#[async_trait]
impl SelectionManager for LastClicked {
    async fn select(&self, identity: SelectionId, additive: bool) -> Result<Vec<SelectionId>> {
        let mut selected = self.0.lock().map_err(|e| MapError::Selection(e.to_string()))?;
        if !additive {
            selected.clear();
        }
        selected.push(identity);
        Ok(selected.clone())
    }
}

/// Tooltip service that prints what it would show
struct PrintTooltips;

impl TooltipService for PrintTooltips {
    fn add_tooltip(
        &self,
        target: OverlayTarget,
        tooltip: TooltipProvider,
        _identity: IdentityProvider,
        _enabled: bool,
    ) {
        let rows: Vec<String> = tooltip()
            .into_iter()
            .map(|item| format!("{}={}", item.display_name, item.value))
            .collect();
        println!("   tooltip #{}: {}", target.index, rows.join(", "));
    }

    fn remove_tooltips(&self, root: OverlayId) {
        println!("   tooltips of overlay {} removed", root.0);
    }
}

/// Drives a symbol layer against a headless map view
fn main() -> Result<()> {
    env_logger::init();

    println!("🗺️ Proportional symbols, headless");
    println!("=================================");

    let map = Arc::new(MapViewport::new(
        LatLng::new(48.0, 10.0),
        4.0,
        Some(Point::new(1024.0, 768.0)),
    ));
    let mut host = SymbolLayerHost::new(
        map.clone(),
        OverlayServices {
            selection: Arc::new(LastClicked::default()),
            tooltips: Arc::new(PrintTooltips),
        },
        Arc::new(LogWarningSink),
        SymbolMapConfig::default(),
    )?;

    let cities = ["London", "Paris", "Berlin", "Madrid", "Rome", "Vaduz"];
    let columns = SymbolDatasetBuilder::new()
        .longitudes(vec![-0.13, 2.35, 13.40, -3.70, 12.50, 9.52])
        .latitudes(vec![51.51, 48.86, 52.52, 40.42, 41.90, 47.14])
        .sizes(vec![8_982_000.0, 2_161_000.0, 3_645_000.0, 3_223_000.0, 2_873_000.0, 5_700.0])
        .tooltips(
            cities
                .iter()
                .map(|name| vec![TooltipItem::new("City", *name)])
                .collect(),
        )
        .identities(cities.iter().map(|name| SelectionKey::shared(*name)).collect());

    println!("✅ Loading {} cities", cities.len());
    host.update_from_columns(columns)?;

    let layer = host.active().ok_or_else(|| MapError::Layer("no active layer".to_string()))?;
    println!(
        "✅ Scale: {} [{}, {}]",
        layer.scale().method,
        layer.scale().min_value,
        layer.scale().max_value
    );

    let mut context = RenderContext::new(1024, 768)?;
    context.clip_to_surface();
    let queued = host.render(&mut context);
    println!("✅ Queued {} circles at zoom {:.2}", queued, map.zoom());
    for command in context.get_drawing_queue() {
        match command {
            DrawCommand::Circle { center, style, .. } => println!(
                "   circle at ({:.1}, {:.1}) r={:.1}",
                center.x, center.y, style.radius
            ),
        }
    }

    if let Some(legend) = host.legend() {
        println!("✅ Legend:");
        for entry in legend.entries() {
            println!("   {:>6}  r={:.1}", entry.label, entry.radius);
        }
    }

    // click on Berlin
    let berlin = host.screen_position(2)?;
    let handled = futures::executor::block_on(host.dispatch(&PointerEvent::click(berlin)))?;
    println!("✅ Click at ({:.1}, {:.1}): {:?}", berlin.x, berlin.y, handled);

    if let Some(layer) = host.active() {
        for (point, symbol) in layer.data().iter().zip(layer.symbols()) {
            println!(
                "   {:<7} opacity {:.2}",
                point.key(),
                layer.effective_opacity(symbol)
            );
        }
    }

    futures::executor::block_on(host.dispatch(&PointerEvent::wheel(berlin, -120.0)))?;
    while map.advance_animation(Duration::from_millis(16)) {}
    println!("✅ Wheel zoom finished at {:.2}", map.zoom());

    Ok(())
}
