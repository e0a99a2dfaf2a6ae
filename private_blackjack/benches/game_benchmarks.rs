use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use private_blackjack::{
    Action, Card, Round,
    bot::{BasicStrategy, Strategy},
    game::{Deck, value},
    messages::ServerMessage,
};
use rand::{SeedableRng, rngs::StdRng};
use std::hint::black_box;

fn cards(tokens: &[&str]) -> Vec<Card> {
    tokens.iter().map(|token| token.parse().unwrap()).collect()
}

/// Benchmark valuing a two-card hand
fn bench_value_2_cards(c: &mut Criterion) {
    let hand = cards(&["AS", "KH"]);
    c.bench_function("value_2_cards", |b| {
        b.iter(|| value(black_box(&hand)));
    });
}

/// Benchmark valuing hands heavy with aces, the worst case for demotion
fn bench_value_many_aces(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_many_aces");
    for n in [2usize, 4, 8, 11] {
        let hand = vec!["AS".parse::<Card>().unwrap(); n];
        group.bench_with_input(BenchmarkId::from_parameter(n), &hand, |b, hand| {
            b.iter(|| value(black_box(hand)));
        });
    }
    group.finish();
}

/// Benchmark shuffling a fresh deck
fn bench_shuffle(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    c.bench_function("deck_shuffle", |b| {
        b.iter(|| Deck::shuffled(&mut rng));
    });
}

/// Benchmark a full round where the player stands on the deal
fn bench_round_stand(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    c.bench_function("round_stand", |b| {
        b.iter(|| {
            Round::shuffled(&mut rng)
                .play_with(|_, _| Action::Stand)
                .unwrap()
        });
    });
}

/// Benchmark a full round under basic strategy
fn bench_round_basic_strategy(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let mut strategy = BasicStrategy;
    c.bench_function("round_basic_strategy", |b| {
        b.iter(|| {
            Round::shuffled(&mut rng)
                .play_with(|hand, up| strategy.decide(hand, up))
                .unwrap()
        });
    });
}

/// Benchmark parsing a settled round off the wire
fn bench_parse_result(c: &mut Criterion) {
    let line = "RESULT DEALER_BUST PLAYER=[10H,7C] DEALER=[6S,10D,9C]";
    c.bench_function("parse_result_line", |b| {
        b.iter(|| black_box(line).parse::<ServerMessage>().unwrap());
    });
}

criterion_group!(
    hand_valuation,
    bench_value_2_cards,
    bench_value_many_aces,
);

criterion_group!(
    round_play,
    bench_shuffle,
    bench_round_stand,
    bench_round_basic_strategy,
    bench_parse_result,
);

criterion_main!(hand_valuation, round_play);
