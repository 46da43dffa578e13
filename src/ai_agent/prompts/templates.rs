// Prompt wording follows the Indonesian dashboard this service replaces.

pub const SUMMARY_PROMPT: &str = "\
Anda adalah analis keuangan.
Berikut adalah breakdown revenue dan cost perusahaan:

{data}

Buat insight singkat dalam 3 poin:
1. Segmen revenue terbesar dan kontribusinya.
2. Apakah ada risiko ketergantungan pada satu segmen?
3. Analisis keseimbangan revenue vs cost.
";

pub const INTERPRETATION_PROMPT: &str = "\
Anda adalah seorang analis keuangan yang handal.
Berdasarkan data segmen pendapatan dan biaya berikut (dalam miliar rupiah):

{data}

Analisis tren utama yang muncul dari data tersebut, meliputi:
1. Apakah revenue tersebar (diversifikasi) atau terkonsentrasi pada 1–2 segmen?
2. Apakah ada gap besar antara revenue dan cost pada segmen tertentu?
3. Apakah ada indikasi anomali pada segmen tertentu?
Sajikan analisis dalam 3 poin utama. Tuliskan dalam bahasa yang singkat, padat, dan jelas.
";

pub const RISK_PROMPT: &str = "\
Anda adalah seorang analis risiko keuangan.
Berdasarkan data pendapatan dan biaya berikut:

{data}

Identifikasi 2-3 potensi risiko utama yang muncul dari pola perbandingan rasio pendapatan dan biaya operasional.
";

/// Reference card for the chart script language, embedded in the synthesis prompt.
pub const CHART_SCRIPT_GUIDE: &str = r##"Bahasa skrip grafik (BUKAN Python):
- Satu pernyataan per baris: `import <modul>` atau `<nama> = <ekspresi>`.
- Ekspresi: angka (1e12), string "..." atau '...', True/False, list [a, b], nama variabel,
  pemanggilan fungsi modul `modul.fungsi(arg, kunci=nilai)`, operator + - * / dan kurung.
- Tidak ada variabel bawaan. Setiap modul yang dipakai WAJIB di-import terlebih dahulu.
- Modul `data`: data.column("source"), data.column("value"), data.symbol(), data.year(), data.len().
- Modul `chart`: chart.bar(x=..., y=..., title=..., x_label=..., y_label=..., rotate_labels=True, colors=["#1f77b4", ...]),
  chart.line(x=..., y=..., title=...), chart.pie(labels=..., values=..., title=...).
- rotate_labels hanya hidup/mati: True atau angka bukan nol membuat label tegak, 0/False mendatar.
- Operasi angka terhadap list bekerja per elemen, misalnya data.column("value") / 1e12.

Contoh:
import chart
import data
labels = data.column("source")
values = data.column("value") / 1e12
fig = chart.bar(x=labels, y=values, title="Judul", x_label="Segmen", y_label="Nilai (triliun IDR)", rotate_labels=True)"##;
