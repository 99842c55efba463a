//! Reference-count balance across every wrapper.
//!
//! After any sequence of wrapper constructions and drops, every object the
//! host created for the caller is freed again and no release ever hits a
//! dead object.

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pyattr_bridge::host::memory::MemoryHost;
use pyattr_bridge::host::value::{ArrayBuffer, HostValue};
use pyattr_bridge::{
    BoolArrayView, DoubleArrayView, DynamicList, ExternalRef, HostRuntime, IntArrayView, ObjHandle,
};

fn traffic(host: &MemoryHost) -> ObjHandle {
    host.alloc(
        HostValue::instance("Traffic")
            .with_attr("lat", HostValue::f64_array(&[52.0, 52.1, 52.2, 52.3]))
            .with_attr("alt", ArrayBuffer::Float32(vec![900.0, 1200.0, 1500.0, 1800.0]))
            .with_attr("inconf", HostValue::bool_array(&[false, true, true, false]))
            .with_attr(
                "trk",
                HostValue::strided(ArrayBuffer::Float64(vec![90.0, 0.0, 180.0, 0.0]), 2),
            )
            .with_attr("ids", HostValue::from(vec!["KL204", "BA117"]))
            .with_attr("ntraf", 4),
    )
}

/// Refcount of every live object, sorted by handle.
fn census(host: &MemoryHost, root: ObjHandle) -> Vec<(u64, usize)> {
    let names = ["lat", "alt", "inconf", "trk", "ids", "ntraf"];
    let mut counts: Vec<(u64, usize)> = names
        .iter()
        .map(|name| {
            let h = host.get_attr(root, name).unwrap();
            host.decref(h);
            (h.raw(), host.refcount(h).unwrap())
        })
        .collect();
    counts.push((root.raw(), host.refcount(root).unwrap()));
    counts.push((host.none().raw(), host.refcount(host.none()).unwrap()));
    counts.sort_unstable();
    counts
}

#[test]
fn test_views_restore_counts() {
    let host = MemoryHost::new();
    let root = traffic(&host);
    let before = census(&host, root);
    let live = host.live_objects();

    {
        let lat = DoubleArrayView::from_attr(&host, root, "lat");
        let alt = DoubleArrayView::from_attr(&host, root, "alt");
        let trk = DoubleArrayView::from_attr(&host, root, "trk");
        let inconf = BoolArrayView::from_attr(&host, root, "inconf");
        let missing = DoubleArrayView::from_attr(&host, root, "missing");
        let ids = DoubleArrayView::from_attr(&host, root, "ids");
        let fresh = IntArrayView::new(&host, 16);
        assert!(lat.is_valid() && alt.is_valid() && trk.is_valid() && inconf.is_valid());
        assert!(!missing.is_valid() && !ids.is_valid());
        assert!(fresh.is_valid());
        // two copies and one new array
        assert_eq!(host.live_objects(), live + 3);
    }

    assert_eq!(census(&host, root), before);
    assert_eq!(host.live_objects(), live);
    assert_eq!(host.stats().invalid_decrefs, 0);
}

#[test]
fn test_lists_restore_counts() {
    let host = MemoryHost::new();
    let root = traffic(&host);
    let before = census(&host, root);
    let live = host.live_objects();

    {
        let ids = DynamicList::from_attr(&host, root, "ids");
        let first = ids.get(0).unwrap().to_owned();
        let mut scratch = DynamicList::new(&host, 3);
        scratch.set_item(0, &first).unwrap();
        scratch.set_item(1, 2.5).unwrap();
        scratch.append(first.clone_ref()).unwrap();
        scratch.append(ids.get(1).unwrap()).unwrap();
        assert!(scratch.set_item(10, 1.0).is_err());
        assert_eq!(scratch.len().unwrap(), 5);
    }

    assert_eq!(census(&host, root), before);
    assert_eq!(host.live_objects(), live);
    assert_eq!(host.stats().invalid_decrefs, 0);
}

#[test]
fn test_increfs_match_decrefs() {
    let host = MemoryHost::new();
    let root = traffic(&host);
    let start = host.stats();

    {
        let parent = ExternalRef::from_borrowed(&host, root);
        let _lat = DoubleArrayView::from_attr_of(&parent, "lat");
        let _alt = DoubleArrayView::from_attr_of(&parent, "alt");
        let list = DynamicList::empty(&host);
        list.append(&parent).unwrap();
        let _ = parent.attr("missing");
    }

    let end = host.stats();
    let acquired = (end.increfs - start.increfs) + (end.allocations - start.allocations);
    assert_eq!(acquired, end.decrefs - start.decrefs);
}

#[test]
fn test_random_sequences_balance() {
    let mut rng = StdRng::seed_from_u64(0x5eed_b12d);

    for _ in 0..50 {
        let host = MemoryHost::new();
        let root = traffic(&host);
        let before = census(&host, root);
        let live = host.live_objects();

        {
            let mut views = Vec::new();
            let mut lists = Vec::new();
            let mut refs = Vec::new();
            for _ in 0..rng.gen_range(1..40) {
                match rng.gen_range(0..7) {
                    0 => views.push(DoubleArrayView::from_attr(&host, root, "lat")),
                    1 => views.push(DoubleArrayView::from_attr(&host, root, "alt")),
                    2 => views.push(DoubleArrayView::new(&host, rng.gen_range(0..8))),
                    3 => lists.push(DynamicList::new(&host, rng.gen_range(0..4))),
                    4 => refs.push(ExternalRef::lookup(&host, root, "ntraf")),
                    5 => {
                        if let Some(list) = lists.last() {
                            let _ = match refs.last() {
                                Some(r) => list.append(r),
                                None => list.append(rng.gen::<f64>()),
                            };
                        }
                    }
                    _ => {
                        if let Some(list) = lists.first_mut() {
                            let index = rng.gen_range(0..6);
                            let _ = list.set_item(index, rng.gen::<i64>());
                        }
                    }
                }
                if rng.gen_bool(0.3) && !views.is_empty() {
                    let index = rng.gen_range(0..views.len());
                    views.swap_remove(index);
                }
                if rng.gen_bool(0.2) {
                    refs.pop();
                }
            }
        }

        assert_eq!(census(&host, root), before);
        assert_eq!(host.live_objects(), live);
        assert_eq!(host.stats().invalid_decrefs, 0);
    }
}
