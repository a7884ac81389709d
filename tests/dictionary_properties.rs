use keyboard_core::persistence::encode;
use keyboard_core::{Dictionary, DictionaryConfig, FileBackend, MemoryBackend, WordEntry};
use std::sync::Arc;
use std::thread;

fn empty_config() -> DictionaryConfig {
    let mut config = DictionaryConfig::default();
    config.seed.enabled = false;
    config.save_every = 0;
    config
}

fn dictionary_with(words: &[&str]) -> Dictionary {
    let dictionary = Dictionary::new(empty_config());
    for word in words {
        dictionary.learn(word);
    }
    dictionary
}

const HISTORY: &[&str] = &[
    "selamat", "pagi", "Selamat", "malam", "makan", "makanan", "Makan", "minum", "pagi", "sampai", "jumpa", "saya",
    "sayang", "Saya", "sama", "sama", "sama", "malam",
];

#[test]
fn test_every_proper_prefix_predicts_the_word() {
    let dictionary = dictionary_with(&["Keyboard"]);
    let key = "keyboard";
    for end in 1..key.len() {
        let prefix = &key[..end];
        assert!(
            dictionary.predict(prefix, 5).contains(&"Keyboard".to_string()),
            "prefix {prefix} lost the word"
        );
    }
    assert!(dictionary.predict(key, 5).is_empty());
}

#[test]
fn test_frequency_orders_results() {
    let dictionary = dictionary_with(&["cat", "cat", "car"]);
    assert_eq!(dictionary.predict("ca", 2), vec!["cat", "car"]);
    assert_eq!(dictionary.predict("ca", 10), vec!["cat", "car"]);
}

#[test]
fn test_results_never_echo_the_prefix() {
    let dictionary = dictionary_with(HISTORY);
    for prefix in ["s", "sa", "sama", "SAYA", "m", "Mak", "makan", "p", "x"] {
        for result in dictionary.predict(prefix, 10) {
            assert_ne!(result.to_lowercase(), prefix.to_lowercase());
        }
    }
}

#[test]
fn test_limit_bounds_result_length() {
    let dictionary = dictionary_with(HISTORY);
    for limit in 0..8 {
        assert!(dictionary.predict("s", limit).len() <= limit);
        assert!(dictionary.candidates("m", limit).len() <= limit);
    }
}

#[test]
fn test_predict_is_read_only() {
    let dictionary = dictionary_with(HISTORY);
    let before = dictionary.snapshot();
    let first = dictionary.predict("sa", 6);
    let second = dictionary.predict("sa", 6);
    assert_eq!(first, second);
    assert_eq!(dictionary.snapshot(), before);
}

#[test]
fn test_case_folding() {
    let dictionary = dictionary_with(&["Cat", "cat"]);
    assert_eq!(dictionary.len(), 1);
    assert_eq!(dictionary.get("CAT").unwrap().frequency, 2);
    let results = dictionary.predict("c", 10);
    assert_eq!(results.iter().filter(|w| w.to_lowercase() == "cat").count(), 1);
}

#[test]
fn test_empty_inputs() {
    let dictionary = dictionary_with(&[""]);
    dictionary.learn("   ");
    assert!(dictionary.is_empty());
    assert!(dictionary.predict("", 5).is_empty());
    assert!(dictionary.candidates("", 5).is_empty());
}

#[test]
fn test_save_then_load_reproduces_predictions() {
    let prefixes = ["s", "sa", "sam", "m", "ma", "mak", "p", "j"];
    let backend = Arc::new(MemoryBackend::new());

    let original = Dictionary::open(empty_config(), backend.clone());
    for word in HISTORY {
        original.learn(word);
    }
    let expected: Vec<Vec<String>> = prefixes.iter().map(|p| original.predict(p, 6)).collect();
    original.flush().unwrap();
    drop(original);

    let restored = Dictionary::open(empty_config(), backend);
    let actual: Vec<Vec<String>> = prefixes.iter().map(|p| restored.predict(p, 6)).collect();
    assert_eq!(actual, expected);

    // The sequence counter resumes after the persisted recency, so a fresh
    // learn of "sayang" outranks "Saya" at equal frequency.
    restored.learn("sayang");
    assert_eq!(restored.predict("say", 2), vec!["sayang", "Saya"]);
}

#[test]
fn test_file_backend_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_dictionary.lkwd");

    let original = Dictionary::open(empty_config(), Arc::new(FileBackend::new(&path)));
    for word in HISTORY {
        original.learn(word);
    }
    let expected = original.predict("sa", 6);
    original.flush().unwrap();
    drop(original);

    let restored = Dictionary::open(empty_config(), Arc::new(FileBackend::new(&path)));
    assert_eq!(restored.predict("sa", 6), expected);
    assert_eq!(restored.get("sama").unwrap().frequency, 3);
}

#[test]
fn test_corrupt_storage_starts_empty_and_seeds() {
    let backend = Arc::new(MemoryBackend::with_bytes(vec![0xde, 0xad, 0xbe, 0xef, 0x01, 0x02]));
    let dictionary = Dictionary::open(DictionaryConfig::default(), backend);
    assert_eq!(dictionary.len(), 6);
    assert_eq!(dictionary.predict("ha", 3), vec!["Halo"]);
}

#[test]
fn test_stored_maximum_recency_does_not_break_learning() {
    let stored = WordEntry { word: "halo".into(), display: "Halo".into(), frequency: 1, recency: u64::MAX };
    let backend = Arc::new(MemoryBackend::with_bytes(encode(&[stored]).unwrap()));
    let dictionary = Dictionary::open(empty_config(), backend);

    dictionary.learn("hal");
    dictionary.learn("halte");
    assert_eq!(dictionary.len(), 3);
    assert_eq!(dictionary.predict("ha", 3), vec!["halte", "hal", "Halo"]);
    assert!(dictionary.get("halo").unwrap().recency < dictionary.get("hal").unwrap().recency);
}

#[test]
fn test_small_candidate_cap_still_completes_a_known_word() {
    let mut config = empty_config();
    config.candidate_cap = 1;
    let dictionary = Dictionary::new(config);
    for word in ["cart", "car", "car"] {
        dictionary.learn(word);
    }
    assert_eq!(dictionary.predict("car", 5), vec!["cart"]);
    assert_eq!(dictionary.predict("ca", 5), vec!["car"]);
}

#[test]
fn test_concurrent_learns_are_not_lost() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 250;

    let dictionary = Arc::new(Dictionary::open(empty_config(), Arc::new(MemoryBackend::new())));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let dictionary = Arc::clone(&dictionary);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    dictionary.learn("newword");
                    dictionary.learn(&format!("thread{t}word{i}"));
                    let _ = dictionary.predict("new", 3);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let entry = dictionary.get("newword").unwrap();
    assert_eq!(entry.frequency, (THREADS * PER_THREAD) as u64);
    assert_eq!(dictionary.len(), 1 + THREADS * PER_THREAD);
}

#[test]
fn test_capacity_bound_holds_under_load() {
    let mut config = empty_config();
    config.max_words = Some(50);
    let dictionary = Dictionary::new(config);
    for _ in 0..5 {
        dictionary.learn("favorit");
    }
    for i in 0..500 {
        dictionary.learn(&format!("kata{i}"));
    }
    assert_eq!(dictionary.len(), 50);
    assert_eq!(dictionary.get("favorit").unwrap().frequency, 5);
    assert!(dictionary.get("kata0").is_none());
    assert!(dictionary.get("kata499").is_some());
    assert_eq!(dictionary.predict("fav", 3), vec!["favorit"]);
}

#[test]
fn test_background_learning_alongside_typing() {
    let dictionary = Arc::new(Dictionary::new(empty_config()));
    dictionary.learn("terjemahan");

    let background = {
        let dictionary = Arc::clone(&dictionary);
        thread::spawn(move || {
            for _ in 0..100 {
                dictionary.learn("terima");
            }
        })
    };
    for _ in 0..100 {
        let results = dictionary.predict("ter", 2);
        assert!(!results.is_empty());
        assert!(results.len() <= 2);
    }
    background.join().unwrap();
    assert_eq!(dictionary.predict("ter", 2), vec!["terima", "terjemahan"]);
}
