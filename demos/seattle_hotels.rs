//! Seattle Hotels Example
//!
//! Drives a headless map session through a short user journey: the map
//! loads, the user clicks a cluster, zooms in, opens a hotel and pans away.
//! Set `RUST_LOG=debug` to see per-frame reconciliation logs.

use clustermap::markers::{MapSurface, MemorySurface};
use clustermap::session::DetailHistory;
use clustermap::{ClickOutcome, ClusterConfig, DisplayId, SessionBuilder, Viewport};
use std::error::Error;

const HOTELS: &str = r#"[
    {"hotel_id": 1, "name": "The Edgewater", "longitude": -122.3519, "latitude": 47.6128,
     "star_rating": 4, "price_per_night": 289, "rating": 4.5, "review_count": 1530},
    {"hotel_id": 2, "name": "Inn at the Market", "longitude": -122.3424, "latitude": 47.6094,
     "star_rating": 4, "price_per_night": "$325", "rating": 4.7, "review_count": 980},
    {"hotel_id": 3, "name": "Hotel Theodore", "longitude": -122.3370, "latitude": 47.6112,
     "star_rating": 4, "price_per_night": 219, "review_count": 760},
    {"hotel_id": 4, "name": "Mayflower Park", "longitude": -122.3378, "latitude": 47.6121,
     "star_rating": 3, "price_per_night": 199, "review_count": 1204},
    {"hotel_id": 5, "name": "Fairmont Olympic", "longitude": -122.3339, "latitude": 47.6076,
     "star_rating": 5, "price_per_night": 449, "rating": 4.6, "review_count": 2210},
    {"hotel_id": 6, "name": "Silver Cloud Stadium", "longitude": -122.3327, "latitude": 47.5919,
     "star_rating": 3, "price_per_night": 239, "review_count": 640},
    {"hotel_id": 7, "name": "University Inn", "longitude": -122.3140, "latitude": 47.6610,
     "star_rating": 3, "price_per_night": 159, "review_count": 410},
    {"hotel_id": 8, "name": "Graduate Seattle", "longitude": -122.3130, "latitude": 47.6600,
     "star_rating": 3, "price_per_night": 179, "review_count": 530},
    {"hotel_id": 9, "name": "Ballard Inn", "longitude": -122.3840, "latitude": 47.6680,
     "star_rating": 3, "price_per_night": 149, "review_count": 210},
    {"hotel_id": 10, "name": "Broken Record", "longitude": -222.0, "latitude": 47.6}
]"#;

fn describe(session: &clustermap::MapSession<MemorySurface, DetailHistory>) {
    for (_, marker) in session.surface().markers() {
        println!(
            "   {:<14} at ({:.4}, {:.4}) scale {:.2}",
            marker.spec.id.to_string(),
            marker.position.x(),
            marker.position.y(),
            marker.scale
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    println!("=== Seattle Hotels ===\n");

    // === Loading ===
    let loaded = clustermap::load_points_from_json(HOTELS)?;
    println!(
        "1. Loaded {} hotels, skipped {}",
        loaded.len(),
        loaded.report.rejected_count()
    );
    for rejected in &loaded.report.rejected {
        println!("   record {}: {}", rejected.index, rejected.reason);
    }

    // === Map ready ===
    let camera = Viewport::from_edges(-122.45, 47.55, -122.25, 47.70, 11.0);
    let mut session = SessionBuilder::new()
        .config(ClusterConfig::default().with_transition_duration_ms(600))
        .points(loaded.points)
        .build(MemorySurface::ready_at(camera), DetailHistory::default())?;

    session.on_map_ready()?;
    println!("\n2. Map ready at zoom 11: {} markers", session.live_marker_count());
    describe(&session);

    // === Cluster click ===
    let biggest = session
        .reconciler()
        .iter()
        .filter_map(|m| match m.id() {
            DisplayId::Cluster(id) => Some((*id, m.id().clone())),
            DisplayId::Point(_) => None,
        })
        .max_by_key(|(id, _)| {
            session
                .engine()
                .index()
                .cluster(*id)
                .map(|c| c.member_count)
                .unwrap_or(0)
        });

    if let Some((_, marker)) = biggest
        && let ClickOutcome::Expanded(transition) = session.on_marker_clicked(&marker)
    {
        println!(
            "\n3. Clicked {}: flying to zoom {} over {}ms",
            marker, transition.zoom, transition.duration_ms
        );
        session.surface_mut().finish_transition();
        if let Some(camera) = session.surface().camera()
            && let Some(stats) = session.on_camera_settled(camera)
        {
            println!(
                "   added {}, removed {}, kept {}",
                stats.added,
                stats.removed,
                stats.unchanged + stats.updated
            );
        }
        describe(&session);
    }

    // === Hotel details ===
    let pin = session
        .live_ids()
        .into_iter()
        .find(|id| matches!(id, DisplayId::Point(_)));
    if let Some(pin) = pin {
        session.on_marker_hover(&pin, true);
        if let ClickOutcome::ShowedDetails(_) = session.on_marker_clicked(&pin)
            && let Some(hotel) = session.details().last_shown()
        {
            println!(
                "\n4. {} ({} stars), {} reviews, from {}",
                hotel.name,
                hotel.star_rating,
                hotel.review_count,
                hotel
                    .price_per_night
                    .as_ref()
                    .and_then(|p| p.amount())
                    .map(|p| format!("${:.0}", p))
                    .unwrap_or_else(|| "n/a".to_string())
            );
        }
    }

    // === Pan away ===
    let elsewhere = Viewport::from_edges(-122.20, 47.40, -122.00, 47.50, 13.0);
    if let Some(stats) = session.on_camera_settled(elsewhere) {
        println!(
            "\n5. Panned away: removed {}, {} markers left",
            stats.removed,
            session.live_marker_count()
        );
    }

    let (surface, details) = session.shutdown();
    println!(
        "\n6. Shut down: {} markers on map, {} added and {} removed in total, {} detail cards",
        surface.marker_count(),
        surface.stats().added,
        surface.stats().removed,
        details.shown.len()
    );
    assert!(surface.is_ready());

    Ok(())
}
