use chrono::Local;
use fiscal_ledger::*;

const SAMPLE: &str = "Mês ou período/ano: Janeiro/2024
CNPJ: 11.222.333/0001-44
Empresa: Mercado Bom Preço Ltda
ENTRADAS
1.102      12.500,00
2.403       3.120,45
SAÍDAS
5.102      18.900,10
5.405       2.000,00
Mês ou período/ano: Fevereiro/2024
CNPJ: 11.222.333/0001-44
Empresa: Mercado Bom Preço Ltda
ENTRADAS
1.102      19.000,00
SAÍDAS
5.102      20.100,00
";

fn main() -> anyhow::Result<()> {
    let paths: Vec<String> = std::env::args().skip(1).collect();
    let parser = FiscalParser::new(FiscalConfig::default())?;
    let mut ledger = Ledger::new();

    let summary = if paths.is_empty() {
        println!("No files given, using the built-in sample declaration.");
        ledger.import(parser.parse_text(SAMPLE))?
    } else {
        parser.import_files(&mut ledger, &paths)?
    };

    println!(
        "{} compan(ies) imported, {} new",
        summary.companies_in_batch, summary.new_companies
    );

    for (cnpj, company) in ledger.dataset() {
        let totals = company_totals(company);
        println!("\n{} - {}", cnpj, company.name);
        for row in monthly_rows(company, parser.config()) {
            println!(
                "  {:<16} faturamento {:>16} compras {:>16} {:>7} {}",
                row.period.to_string(),
                format_currency(row.revenue),
                format_currency(row.purchases),
                format_percentage(row.purchase_ratio_percent),
                row.status.label()
            );
        }
        println!(
            "  {:<16} faturamento {:>16} compras {:>16} {:>7}",
            "TOTAL",
            format_currency(totals.revenue),
            format_currency(totals.purchases),
            format_percentage(totals.purchase_ratio_percent)
        );
    }

    let report = ConsolidatedReport::build(ledger.dataset(), parser.config());
    println!("\n{}", report.to_markdown());
    println!(
        "Suggested export name: {}",
        report_file_stem("consolidado", Local::now().date_naive())
    );

    Ok(())
}
