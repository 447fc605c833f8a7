//! Quick benchmark for template analysis and model synthesis

use std::time::Instant;

use template_infer::{analyze, MemoryTemplateSource, ModelInference};

fn main() {
    let templates = vec![
        ("plain", "<p>No expressions at all</p>".to_string()),
        ("simple", r#"<p th:text="${user.profile.name}"></p>"#.to_string()),
        (
            "loop",
            r#"<tr th:each="row, stat : ${page.rows}">
                 <td th:text="${row.amount}"></td>
                 <td th:text="${#temporals.format(row.createdDate, 'yyyy-MM-dd')}"></td>
               </tr>"#
                .to_string(),
        ),
        ("large", large_template(200)),
    ];

    println!("Template Analysis Performance Test");
    println!("==================================\n");

    for (name, html) in &templates {
        let iterations = 10_000;
        let start = Instant::now();

        for _ in 0..iterations {
            let _ = analyze(html, ["label"]).to_inferred_model();
        }

        let elapsed = start.elapsed();
        println!("Template: {name} ({} bytes)", html.len());
        println!("  Time for {} iterations: {:?}", iterations, elapsed);
        println!("  Per operation: {:?}\n", elapsed / iterations);
    }

    println!("Recursive Inference (cached vs cold)");
    println!("====================================\n");

    let source = MemoryTemplateSource::new()
        .with_template("pages/home", large_template(50) + r#"<div th:replace="~{fragments/a :: a}"></div>"#)
        .with_template("fragments/a", large_template(50) + r#"<div th:replace="~{fragments/b :: b}"></div>"#)
        .with_template("fragments/b", large_template(50));
    let inference = ModelInference::new(source);
    let iterations = 2_000;

    let start = Instant::now();
    for _ in 0..iterations {
        inference.clear_cache();
        let _ = inference.infer_model("pages/home", Vec::<String>::new());
    }
    let cold = start.elapsed();

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = inference.infer_model("pages/home", Vec::<String>::new());
    }
    let cached = start.elapsed();

    println!("  Cold:   {:?} per model", cold / iterations);
    println!("  Cached: {:?} per model", cached / iterations);
}

fn large_template(sections: usize) -> String {
    (0..sections)
        .map(|i| {
            format!(
                r#"<section th:with="local{i}=${{base{i}.value}}">
                     <h2 th:text="${{page{i}.title}}"></h2>
                     <li th:each="item{i} : ${{page{i}.items}}" th:text="${{item{i}.label}}"></li>
                     <p th:if="${{page{i}.isVisible and local{i} != null}}"></p>
                   </section>"#
            )
        })
        .collect()
}
