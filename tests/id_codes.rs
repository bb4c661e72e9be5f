use cardforge::content::generate_id_code;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn digits_are_uniform_across_placeholders() {
    let template = "241####042";
    let mut rng = StdRng::seed_from_u64(2024);
    let mut counts = [0u32; 10];
    let n = 10_000;
    for _ in 0..n {
        let code = generate_id_code(template, &mut rng);
        assert_eq!(code.len(), template.len());
        assert!(code.starts_with("241") && code.ends_with("042"));
        for c in code[3..7].chars() {
            counts[c.to_digit(10).unwrap() as usize] += 1;
        }
    }
    // 40k digits, 4k expected per bucket; chi-square with 9 dof stays well under 30.
    let expected = f64::from(n * 4) / 10.0;
    let chi2: f64 = counts
        .iter()
        .map(|&c| (f64::from(c) - expected).powi(2) / expected)
        .sum();
    assert!(chi2 < 30.0, "chi2={chi2} counts={counts:?}");
}

#[test]
fn literal_characters_survive_untouched() {
    let mut rng = StdRng::seed_from_u64(1);
    let code = generate_id_code("MCA###-##", &mut rng);
    assert_eq!(code.len(), 9);
    assert_eq!(&code[..3], "MCA");
    assert_eq!(&code[6..7], "-");
    assert!(code[3..6].chars().chain(code[7..].chars()).all(|c| c.is_ascii_digit()));
}
