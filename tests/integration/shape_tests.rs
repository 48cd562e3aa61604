//! Composite argument and return shapes through a full call.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::harness::serve_with;

#[test]
fn string_map_and_nested_vectors() {
    let (mut client, server) = serve_with(|reg| {
        reg.register("word_lengths", |words: Vec<String>| {
            words
                .into_iter()
                .map(|w| {
                    let n = w.chars().count();
                    (w, n)
                })
                .collect::<BTreeMap<String, usize>>()
        });
        reg.register("transpose", |m: Vec<Vec<i16>>| {
            let cols = m.first().map_or(0, Vec::len);
            (0..cols)
                .map(|c| m.iter().map(|row| row[c]).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        });
    });

    let lengths: BTreeMap<String, usize> = client
        .call("word_lengths", (vec!["héllo".to_owned(), String::new()],))
        .unwrap();
    assert_eq!(lengths["héllo"], 5);
    assert_eq!(lengths[""], 0);

    let t: Vec<Vec<i16>> = client
        .call("transpose", (vec![vec![1i16, 2, 3], vec![4, 5, 6]],))
        .unwrap();
    assert_eq!(t, [vec![1, 4], vec![2, 5], vec![3, 6]]);

    drop(client);
    let (_, handled) = server.join().unwrap();
    assert_eq!(handled, 2);
}

#[test]
fn tuples_arrays_and_sets() {
    let (mut client, server) = serve_with(|reg| {
        reg.register("split", |p: (u8, [u32; 3], char)| (p.2, p.1.iter().sum::<u32>(), p.0));
        reg.register("uniq", |v: Vec<u16>| v.into_iter().collect::<HashSet<u16>>());
        reg.register("index", |m: HashMap<String, i8>, key: String| {
            m.get(&key).copied().unwrap_or_default()
        });
    });

    let (c, sum, b): (char, u32, u8) = client.call("split", ((9u8, [1u32, 2, 3], 'λ'),)).unwrap();
    assert_eq!((c, sum, b), ('λ', 6, 9));

    let set: HashSet<u16> = client.call("uniq", (vec![3u16, 3, 1, 2, 1],)).unwrap();
    assert_eq!(set, HashSet::from([1, 2, 3]));

    let table = HashMap::from([("x".to_owned(), -1i8), ("y".to_owned(), 2)]);
    let hit: i8 = client.call("index", (table.clone(), "y")).unwrap();
    let miss: i8 = client.call("index", (table, "z")).unwrap();
    assert_eq!(hit, 2);
    assert_eq!(miss, 0);

    drop(client);
    server.join().unwrap();
}

#[test]
fn eight_argument_function() {
    let (mut client, server) = serve_with(|reg| {
        reg.register(
            "sum8",
            |a: u8, b: u16, c: u32, d: u64, e: i8, f: i16, g: i32, h: i64| {
                i128::from(a)
                    + i128::from(b)
                    + i128::from(c)
                    + i128::from(d)
                    + i128::from(e)
                    + i128::from(f)
                    + i128::from(g)
                    + i128::from(h)
            },
        );
    });

    let total: i128 = client
        .call("sum8", (1u8, 2u16, 3u32, 4u64, -5i8, -6i16, 7i32, 8i64))
        .unwrap();
    assert_eq!(total, 14);

    drop(client);
    server.join().unwrap();
}
